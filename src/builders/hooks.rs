use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::info;

const HOOK_MARKER: &str = "Git Preflight";

const PRE_COMMIT_HOOK: &str = r#"#!/bin/sh
# Git Preflight - Pre-commit Hook

# Check if git-preflight is available
if ! command -v git-preflight > /dev/null 2>&1; then
    echo "Warning: git-preflight not found in PATH"
    exit 0
fi

# Run the triggers matching the changed files
exec git-preflight run
"#;

const PRE_PUSH_HOOK: &str = r#"#!/bin/sh
# Git Preflight - Pre-push Hook

# Check if git-preflight is available
if ! command -v git-preflight > /dev/null 2>&1; then
    echo "Warning: git-preflight not found in PATH"
    exit 0
fi

# Run the triggers matching everything changed since the merge-base
exec git-preflight run
"#;

/// Installs the `pre-commit` and `pre-push` hooks into `hooks_dir`.
pub fn install_git_hooks(hooks_dir: &Path) -> Result<()> {
    fs::create_dir_all(hooks_dir)?;

    install_hook(hooks_dir, "pre-commit", PRE_COMMIT_HOOK)?;
    install_hook(hooks_dir, "pre-push", PRE_PUSH_HOOK)?;

    Ok(())
}

fn install_hook(hooks_dir: &Path, hook_name: &str, hook_content: &str) -> Result<()> {
    let hook_path = hooks_dir.join(hook_name);

    if hook_path.exists() {
        // Check if it's already our hook
        let existing_content = fs::read_to_string(&hook_path)?;
        if existing_content.contains(HOOK_MARKER) {
            println!("ℹ️  {hook_name} hook already installed");
            return Ok(());
        }

        // Backup existing hook
        let backup_path = hooks_dir.join(format!("{hook_name}.backup"));
        fs::rename(&hook_path, &backup_path)?;
        info!("moved existing hook to {}", backup_path.display());
        println!("ℹ️  Backed up existing {hook_name} hook");
    }

    fs::write(&hook_path, hook_content)?;

    // Make executable on Unix systems
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&hook_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&hook_path, perms)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_installs_hooks() {
        let dir = tempdir().unwrap();
        let hooks_dir = dir.path().join(".git/hooks");
        install_git_hooks(&hooks_dir).unwrap();

        for hook in ["pre-commit", "pre-push"] {
            let content = fs::read_to_string(hooks_dir.join(hook)).unwrap();
            assert!(content.contains("git-preflight run"));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(hooks_dir.join("pre-commit"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn test_backs_up_foreign_hook_once() {
        let dir = tempdir().unwrap();
        let hooks_dir = dir.path().join(".git/hooks");
        fs::create_dir_all(&hooks_dir).unwrap();
        fs::write(hooks_dir.join("pre-commit"), "#!/bin/sh\nmake lint\n").unwrap();

        install_git_hooks(&hooks_dir).unwrap();
        install_git_hooks(&hooks_dir).unwrap();

        let backup = fs::read_to_string(hooks_dir.join("pre-commit.backup")).unwrap();
        assert_eq!(backup, "#!/bin/sh\nmake lint\n");
        let hook = fs::read_to_string(hooks_dir.join("pre-commit")).unwrap();
        assert!(hook.contains(HOOK_MARKER));
    }
}
