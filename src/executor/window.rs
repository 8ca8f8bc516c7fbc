// Foreground window geometry, maximize, and open-or-focus app control.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::DeskPilotResult;
use crate::executor::input::InputDriver;
use crate::perception::types::ForegroundWindow;

/// Friendly app name → process executable (lowercase keys).
const APP_PROCESS_MAP: &[(&str, &str)] = &[
    ("chrome", "chrome.exe"),
    ("google chrome", "chrome.exe"),
    ("firefox", "firefox.exe"),
    ("edge", "msedge.exe"),
    ("microsoft edge", "msedge.exe"),
    ("spotify", "Spotify.exe"),
    ("notepad", "notepad.exe"),
    ("explorer", "explorer.exe"),
    ("file explorer", "explorer.exe"),
    ("vscode", "Code.exe"),
    ("visual studio code", "Code.exe"),
    ("code", "Code.exe"),
    ("cursor", "Cursor.exe"),
    ("discord", "Discord.exe"),
    ("slack", "slack.exe"),
    ("teams", "Teams.exe"),
    ("microsoft teams", "Teams.exe"),
    ("word", "WINWORD.EXE"),
    ("excel", "EXCEL.EXE"),
    ("powerpoint", "POWERPNT.EXE"),
    ("outlook", "OUTLOOK.EXE"),
    ("terminal", "WindowsTerminal.exe"),
    ("windows terminal", "WindowsTerminal.exe"),
    ("cmd", "cmd.exe"),
    ("powershell", "powershell.exe"),
    ("calculator", "Calculator.exe"),
    ("calc", "Calculator.exe"),
    ("paint", "mspaint.exe"),
    ("snipping tool", "SnippingTool.exe"),
    ("settings", "SystemSettings.exe"),
];

/// Processes whose windows are never maximized (the agent's own host, IDEs).
const SKIP_MAXIMIZE: &[&str] = &["python.exe", "pythonw.exe", "cursor.exe", "code.exe"];

const FOCUS_TIMEOUT: Duration = Duration::from_secs(2);
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaximizeOutcome {
    AlreadyMaximized,
    SkippedProtected,
    Maximized,
    Failed,
    NoForegroundWindow,
    Unsupported,
}

impl MaximizeOutcome {
    /// Outcomes worth reporting back to the model.
    pub fn failure_reason(self) -> Option<&'static str> {
        match self {
            MaximizeOutcome::AlreadyMaximized
            | MaximizeOutcome::SkippedProtected
            | MaximizeOutcome::Maximized => None,
            MaximizeOutcome::Failed => Some("failed"),
            MaximizeOutcome::NoForegroundWindow => Some("no_foreground_window"),
            MaximizeOutcome::Unsupported => Some("unsupported"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAppOutcome {
    Focused,
    Launched,
    Failed,
}

/// OS window operations used by the loop and the dispatcher.
#[async_trait]
pub trait WindowControl: Send + Sync {
    /// Title, physical rectangle and process of the foreground window, if any.
    async fn foreground_window(&self) -> DeskPilotResult<Option<ForegroundWindow>>;
    async fn maximize_foreground(&self) -> DeskPilotResult<MaximizeOutcome>;
    /// Focus an existing window of the app, or launch it.
    async fn open_app(&self, name: &str) -> DeskPilotResult<OpenAppOutcome>;
}

/// Executable name for a friendly app name (`notepad` → `notepad.exe`).
pub fn resolve_process_name(app: &str) -> String {
    let lower = app.trim().to_lowercase();
    let exe = APP_PROCESS_MAP
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, exe)| exe.to_string())
        .unwrap_or_else(|| app.trim().to_string());
    if exe.to_lowercase().ends_with(".exe") {
        exe
    } else {
        format!("{exe}.exe")
    }
}

/// Whether the running process `process` belongs to the app the model named.
pub fn process_matches(app: &str, process: &str) -> bool {
    let app = app.trim().to_lowercase();
    let process = process.to_lowercase();
    app == process
        || format!("{app}.exe") == process
        || resolve_process_name(&app).to_lowercase() == process
}

pub fn skip_maximize(process: &str) -> bool {
    let process = process.to_lowercase();
    SKIP_MAXIMIZE.contains(&process.as_str())
}

/// Platform window control. On Windows, launching goes through the Start menu
/// and therefore needs the input driver.
pub struct NativeWindowControl {
    #[cfg_attr(not(target_os = "windows"), allow(dead_code))]
    input: Arc<dyn InputDriver>,
}

impl NativeWindowControl {
    pub fn new(input: Arc<dyn InputDriver>) -> Self {
        Self { input }
    }
}

// ── Windows implementation ──────────────────────────────────────────────────

#[cfg(target_os = "windows")]
mod win {
    use super::*;
    use crate::perception::types::ScreenRect;
    use windows::core::PWSTR;
    use windows::Win32::Foundation::{CloseHandle, BOOL, HWND, LPARAM, RECT};
    use windows::Win32::System::Threading::{
        AttachThreadInput, GetCurrentThreadId, OpenProcess, QueryFullProcessImageNameW,
        PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetForegroundWindow, GetWindowRect, GetWindowTextW,
        GetWindowThreadProcessId, IsIconic, IsWindowVisible, IsZoomed, SetForegroundWindow,
        ShowWindow, SW_MAXIMIZE, SW_RESTORE,
    };

    fn window_title(hwnd: HWND) -> String {
        let mut buf = [0u16; 512];
        let len = unsafe { GetWindowTextW(hwnd, &mut buf) };
        String::from_utf16_lossy(&buf[..len.max(0) as usize])
    }

    fn process_name(hwnd: HWND) -> Option<String> {
        let mut pid = 0u32;
        unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid as *mut u32)) };
        if pid == 0 {
            return None;
        }
        let handle = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, BOOL(0), pid) }.ok()?;
        let mut buf = [0u16; 1024];
        let mut size = buf.len() as u32;
        let queried = unsafe {
            QueryFullProcessImageNameW(handle, PROCESS_NAME_WIN32, PWSTR(buf.as_mut_ptr()), &mut size)
        };
        unsafe {
            let _ = CloseHandle(handle);
        }
        queried.ok()?;
        let path = String::from_utf16_lossy(&buf[..size as usize]);
        path.rsplit(['\\', '/']).next().map(str::to_string)
    }

    pub fn foreground_info() -> Option<ForegroundWindow> {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.0.is_null() {
            return None;
        }
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd, &mut rect) }.ok()?;
        Some(ForegroundWindow {
            name: window_title(hwnd),
            rect: ScreenRect::new(
                rect.left,
                rect.top,
                (rect.right - rect.left).max(0) as u32,
                (rect.bottom - rect.top).max(0) as u32,
            ),
            process_name: process_name(hwnd),
        })
    }

    pub fn is_app_foreground(app: &str) -> bool {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.0.is_null() {
            return false;
        }
        process_name(hwnd).is_some_and(|p| process_matches(app, &p))
    }

    pub fn maximize_foreground() -> MaximizeOutcome {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.0.is_null() {
            return MaximizeOutcome::NoForegroundWindow;
        }
        if process_name(hwnd).is_some_and(|p| skip_maximize(&p)) {
            return MaximizeOutcome::SkippedProtected;
        }
        if unsafe { IsZoomed(hwnd) }.as_bool() {
            return MaximizeOutcome::AlreadyMaximized;
        }
        unsafe {
            let _ = ShowWindow(hwnd, SW_MAXIMIZE);
        }
        std::thread::sleep(Duration::from_millis(50));
        if unsafe { IsZoomed(hwnd) }.as_bool() {
            MaximizeOutcome::Maximized
        } else {
            MaximizeOutcome::Failed
        }
    }

    unsafe extern "system" fn collect_visible(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let out = &mut *(lparam.0 as *mut Vec<HWND>);
        if IsWindowVisible(hwnd).as_bool() {
            out.push(hwnd);
        }
        BOOL(1)
    }

    fn windows_of(process: &str) -> Vec<HWND> {
        let mut all: Vec<HWND> = Vec::new();
        unsafe {
            let _ = EnumWindows(Some(collect_visible), LPARAM(&mut all as *mut Vec<HWND> as isize));
        }
        let process = process.to_lowercase();
        all.into_iter()
            .filter(|h| !window_title(*h).is_empty())
            .filter(|h| process_name(*h).is_some_and(|p| p.to_lowercase() == process))
            .collect()
    }

    fn focus_window(hwnd: HWND) -> bool {
        unsafe {
            if IsIconic(hwnd).as_bool() {
                let _ = ShowWindow(hwnd, SW_RESTORE);
            }
            let _ = SetForegroundWindow(hwnd);

            // Foreground lock: borrow the foreground thread's input state.
            let fg = GetForegroundWindow();
            if fg != hwnd && !fg.0.is_null() {
                let fg_thread = GetWindowThreadProcessId(fg, None);
                let me = GetCurrentThreadId();
                if fg_thread != me {
                    let _ = AttachThreadInput(me, fg_thread, BOOL(1));
                    let _ = SetForegroundWindow(hwnd);
                    let _ = AttachThreadInput(me, fg_thread, BOOL(0));
                }
            }
        }
        std::thread::sleep(Duration::from_millis(100));
        unsafe { GetForegroundWindow() == hwnd }
    }

    /// Focus the first titled, visible window of the app's process.
    pub fn focus_app(app: &str) -> bool {
        let process = resolve_process_name(app);
        windows_of(&process).into_iter().any(focus_window)
    }
}

#[cfg(target_os = "windows")]
impl NativeWindowControl {
    async fn wait_for_foreground(&self, app: &str, timeout: Duration) -> DeskPilotResult<bool> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let name = app.to_string();
            let fg = tokio::task::spawn_blocking(move || win::is_app_foreground(&name))
                .await
                .map_err(|e| crate::errors::DeskPilotError::join("foreground poll", e))?;
            if fg {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn launch_via_start_menu(&self, app: &str) -> DeskPilotResult<bool> {
        self.input.press_key("win").await?;
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.input.type_text(app).await?;
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.input.press_key("enter").await?;
        self.wait_for_foreground(app, LAUNCH_TIMEOUT).await
    }
}

#[cfg(target_os = "windows")]
#[async_trait]
impl WindowControl for NativeWindowControl {
    async fn foreground_window(&self) -> DeskPilotResult<Option<ForegroundWindow>> {
        tokio::task::spawn_blocking(win::foreground_info)
            .await
            .map_err(|e| crate::errors::DeskPilotError::join("foreground window", e))
    }

    async fn maximize_foreground(&self) -> DeskPilotResult<MaximizeOutcome> {
        tokio::task::spawn_blocking(win::maximize_foreground)
            .await
            .map_err(|e| crate::errors::DeskPilotError::join("maximize", e))
    }

    async fn open_app(&self, name: &str) -> DeskPilotResult<OpenAppOutcome> {
        let app = name.to_string();
        let focused = tokio::task::spawn_blocking(move || win::focus_app(&app))
            .await
            .map_err(|e| crate::errors::DeskPilotError::join("focus app", e))?;
        if focused && self.wait_for_foreground(name, FOCUS_TIMEOUT).await? {
            tracing::info!(app = name, "app focused");
            return Ok(OpenAppOutcome::Focused);
        }
        if self.launch_via_start_menu(name).await? {
            tracing::info!(app = name, "app launched");
            return Ok(OpenAppOutcome::Launched);
        }
        tracing::warn!(app = name, "app did not reach the foreground");
        Ok(OpenAppOutcome::Failed)
    }
}

// ── Fallback for other platforms ────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
#[async_trait]
impl WindowControl for NativeWindowControl {
    async fn foreground_window(&self) -> DeskPilotResult<Option<ForegroundWindow>> {
        Ok(None)
    }

    async fn maximize_foreground(&self) -> DeskPilotResult<MaximizeOutcome> {
        Ok(MaximizeOutcome::Unsupported)
    }

    async fn open_app(&self, name: &str) -> DeskPilotResult<OpenAppOutcome> {
        #[cfg(target_os = "macos")]
        let launched = tokio::process::Command::new("open")
            .args(["-a", name])
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false);

        #[cfg(not(target_os = "macos"))]
        let launched = tokio::process::Command::new(name.trim().to_lowercase())
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .is_ok();

        if launched {
            // give the new window a moment to appear
            tokio::time::sleep(POLL_INTERVAL).await;
            tracing::info!(app = name, "app launched");
            Ok(OpenAppOutcome::Launched)
        } else {
            tracing::warn!(app = name, "app launch failed");
            Ok(OpenAppOutcome::Failed)
        }
    }
}
