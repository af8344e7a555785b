//! Completion notifications.
//!
//! The desktop implementation shells out to the platform's notifier. Failures
//! are reported to the caller, which logs and moves on.

use std::process::Command;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to launch notifier `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("notifier `{program}` exited with {status}")]
    Failed { program: String, status: String },
    #[error("no desktop notifier for this platform")]
    Unsupported,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Discards notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, title: &str, _body: &str) -> Result<(), NotifyError> {
        debug!(title, "notification suppressed");
        Ok(())
    }
}

/// Target platform for desktop notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

/// Spawns the platform notifier (`notify-send`, `osascript`, PowerShell).
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    platform: Platform,
}

impl DesktopNotifier {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Program and arguments for a notification, or `None` if unsupported.
    pub fn command_line(&self, title: &str, body: &str) -> Option<(String, Vec<String>)> {
        match self.platform {
            Platform::Linux => Some((
                "notify-send".to_string(),
                vec![title.to_string(), body.to_string()],
            )),
            Platform::MacOs => Some((
                "osascript".to_string(),
                vec![
                    "-e".to_string(),
                    format!(
                        "display notification \"{}\" with title \"{}\"",
                        applescript_escape(body),
                        applescript_escape(title)
                    ),
                ],
            )),
            Platform::Windows => Some((
                "powershell".to_string(),
                vec![
                    "-NoProfile".to_string(),
                    "-Command".to_string(),
                    powershell_toast(title, body),
                ],
            )),
            Platform::Other => None,
        }
    }
}

fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn powershell_toast(title: &str, body: &str) -> String {
    let quote = |s: &str| s.replace('\'', "''");
    format!(
        "[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] > $null; \
         $t = [Windows.UI.Notifications.ToastNotificationManager]::GetTemplateContent([Windows.UI.Notifications.ToastTemplateType]::ToastText02); \
         $x = $t.GetElementsByTagName('text'); \
         $x.Item(0).AppendChild($t.CreateTextNode('{}')) > $null; \
         $x.Item(1).AppendChild($t.CreateTextNode('{}')) > $null; \
         [Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier('perpscan').Show([Windows.UI.Notifications.ToastNotification]::new($t))",
        quote(title),
        quote(body)
    )
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let (program, args) = self
            .command_line(title, body)
            .ok_or(NotifyError::Unsupported)?;
        let status = Command::new(&program)
            .args(&args)
            .status()
            .map_err(|source| NotifyError::Spawn {
                program: program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(NotifyError::Failed {
                program,
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// Pick the notifier once at startup.
pub fn notifier_for_platform(enabled: bool) -> Box<dyn Notifier> {
    if !enabled {
        return Box::new(NoopNotifier);
    }
    match Platform::current() {
        Platform::Other => Box::new(NoopNotifier),
        platform => Box::new(DesktopNotifier::new(platform)),
    }
}
