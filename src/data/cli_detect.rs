use std::process::{Command, Stdio};

/// Check if a CLI tool is available on PATH.
pub fn is_available(cmd: &str) -> bool {
    Command::new(cmd)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_is_unavailable() {
        assert!(!is_available("sprout-definitely-missing-tool"));
    }
}
