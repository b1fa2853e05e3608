//! Routing a command through the external resource limiter
//!
//! The limiter is invoked as
//! `<limiter> <limiter args...> -wdir <dir> -executable <path> -- <original args...>`
//! from the current directory. The flag names and their order are the
//! limiter's command-line contract and must not change.

use std::path::Path;

use crate::command::CommandSpec;

/// Rewrite `spec` to run under `limiter_program` when it carries limiter arguments
///
/// `cwd` becomes the new working directory; a relative `limiter_program` is
/// resolved against it. Returns whether `spec` was rewritten.
pub fn apply_limiter(spec: &mut CommandSpec, limiter_program: &Path, cwd: &Path) -> bool {
    if spec.limiter_args.is_empty() {
        return false;
    }

    let mut arguments = Vec::with_capacity(spec.limiter_args.len() + 5 + spec.arguments.len());
    arguments.extend(spec.limiter_args.iter().cloned());
    arguments.push("-wdir".to_string());
    arguments.push(spec.working_dir.display().to_string());
    arguments.push("-executable".to_string());
    arguments.push(spec.executable.display().to_string());
    arguments.push("--".to_string());
    arguments.append(&mut spec.arguments);

    spec.arguments = arguments;
    spec.executable = cwd.join(limiter_program);
    spec.working_dir = cwd.to_path_buf();
    true
}
