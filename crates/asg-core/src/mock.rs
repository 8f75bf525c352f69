//! Mock input driver and window platform for exercising the executor
//! without a real desktop.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::action::MouseButton;
use crate::activation::Strategy;
use crate::input::{InputDriver, KeyDirection};
use crate::keys::{Chord, Modifier, NamedKey};
use crate::platform::{PlatformError, WindowPlatform};
use crate::process::{ProcessInfo, WindowHandle};

/// One primitive the executor asked the driver for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCall {
    Move(i32, i32),
    Click(MouseButton),
    Type(String),
    Tap(NamedKey),
    Toggle(Modifier, KeyDirection),
    PixelColor(i32, i32),
    LocateImage(PathBuf),
    PointerLocation,
    ProcessNames,
}

/// Records every call; query results are configured up front.
#[derive(Debug, Default)]
pub struct MockDriver {
    pub calls: Vec<InputCall>,
    pixels: HashMap<(i32, i32), String>,
    images: HashMap<PathBuf, (i32, i32)>,
    processes: Option<Vec<String>>,
    pointer: (i32, i32),
    failing_clicks: bool,
    failing_modifier: Option<Modifier>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self { processes: Some(Vec::new()), ..Self::default() }
    }

    pub fn with_pixel(mut self, x: i32, y: i32, rrggbb: &str) -> Self {
        self.pixels.insert((x, y), rrggbb.to_string());
        self
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>, centre: (i32, i32)) -> Self {
        self.images.insert(path.into(), centre);
        self
    }

    pub fn with_processes(mut self, names: &[&str]) -> Self {
        self.processes = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn with_pointer(mut self, x: i32, y: i32) -> Self {
        self.pointer = (x, y);
        self
    }

    /// Make process enumeration fail.
    pub fn without_process_list(mut self) -> Self {
        self.processes = None;
        self
    }

    pub fn failing_clicks(mut self) -> Self {
        self.failing_clicks = true;
        self
    }

    /// Make pressing `modifier` fail.
    pub fn failing_modifier(mut self, modifier: Modifier) -> Self {
        self.failing_modifier = Some(modifier);
        self
    }

    /// Calls that change input state, without read-only queries.
    pub fn input_calls(&self) -> Vec<InputCall> {
        self.calls
            .iter()
            .filter(|c| {
                !matches!(
                    c,
                    InputCall::PixelColor(..)
                        | InputCall::LocateImage(_)
                        | InputCall::PointerLocation
                        | InputCall::ProcessNames
                )
            })
            .cloned()
            .collect()
    }
}

impl InputDriver for MockDriver {
    fn move_to(&mut self, x: i32, y: i32) -> anyhow::Result<()> {
        self.calls.push(InputCall::Move(x, y));
        Ok(())
    }

    fn click(&mut self, button: MouseButton) -> anyhow::Result<()> {
        self.calls.push(InputCall::Click(button));
        if self.failing_clicks {
            anyhow::bail!("mock click failure");
        }
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.calls.push(InputCall::Type(text.to_string()));
        Ok(())
    }

    fn tap(&mut self, key: NamedKey) -> anyhow::Result<()> {
        self.calls.push(InputCall::Tap(key));
        Ok(())
    }

    fn toggle_modifier(&mut self, modifier: Modifier, direction: KeyDirection) -> anyhow::Result<()> {
        if direction == KeyDirection::Press && self.failing_modifier == Some(modifier) {
            anyhow::bail!("mock {modifier} press failure");
        }
        self.calls.push(InputCall::Toggle(modifier, direction));
        Ok(())
    }

    fn pixel_color(&mut self, x: i32, y: i32) -> anyhow::Result<String> {
        self.calls.push(InputCall::PixelColor(x, y));
        self.pixels
            .get(&(x, y))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no pixel configured at ({x}, {y})"))
    }

    fn locate_image(&mut self, path: &Path) -> anyhow::Result<Option<(i32, i32)>> {
        self.calls.push(InputCall::LocateImage(path.to_path_buf()));
        Ok(self.images.get(path).copied())
    }

    fn pointer_location(&mut self) -> anyhow::Result<(i32, i32)> {
        self.calls.push(InputCall::PointerLocation);
        // Moves update the pointer the way a real desktop would.
        Ok(self
            .calls
            .iter()
            .rev()
            .find_map(|c| match c {
                InputCall::Move(x, y) => Some((*x, *y)),
                _ => None,
            })
            .unwrap_or(self.pointer))
    }

    fn process_names(&mut self) -> anyhow::Result<Vec<String>> {
        self.calls.push(InputCall::ProcessNames);
        self.processes
            .clone()
            .ok_or_else(|| anyhow::anyhow!("mock process listing unavailable"))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// One capability call made against [`MockPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    ActivateWindow(WindowHandle),
    ActivateProcess(String),
    ActivateBundle(String),
    ActivatePath(PathBuf),
    SendChord(String),
}

/// Every strategy fails unless enabled with [`MockPlatform::succeed`].
#[derive(Debug, Default)]
pub struct MockPlatform {
    succeeding: HashSet<Strategy>,
    native_chords: bool,
    foreground: Option<ProcessInfo>,
    calls: Mutex<Vec<PlatformCall>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(mut self, strategy: Strategy) -> Self {
        self.succeeding.insert(strategy);
        self
    }

    pub fn with_native_chords(mut self) -> Self {
        self.native_chords = true;
        self
    }

    pub fn with_foreground(mut self, info: ProcessInfo) -> Self {
        self.foreground = Some(info);
        self
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: PlatformCall, strategy: Strategy) -> Result<(), PlatformError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.succeeding.contains(&strategy) {
            Ok(())
        } else {
            Err(anyhow::anyhow!("mock {strategy} failure").into())
        }
    }
}

impl WindowPlatform for MockPlatform {
    fn platform_name(&self) -> &str {
        "mock"
    }

    fn activate_window(&self, handle: WindowHandle) -> Result<(), PlatformError> {
        self.record(PlatformCall::ActivateWindow(handle), Strategy::WindowHandle)
    }

    fn activate_process(&self, name: &str) -> Result<(), PlatformError> {
        self.record(PlatformCall::ActivateProcess(name.to_string()), Strategy::ProcessName)
    }

    fn activate_bundle_id(&self, bundle_id: &str) -> Result<(), PlatformError> {
        self.record(PlatformCall::ActivateBundle(bundle_id.to_string()), Strategy::BundleId)
    }

    fn activate_path(&self, path: &Path) -> Result<(), PlatformError> {
        self.record(PlatformCall::ActivatePath(path.to_path_buf()), Strategy::AppPath)
    }

    fn send_chord(&self, chord: &Chord) -> Result<(), PlatformError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(PlatformCall::SendChord(chord.to_string()));
        }
        if self.native_chords {
            Ok(())
        } else {
            Err(PlatformError::unsupported("native key chords", "mock"))
        }
    }

    fn running_processes(&self) -> anyhow::Result<Vec<ProcessInfo>> {
        Ok(self.foreground.iter().cloned().collect())
    }

    fn foreground_process(&self) -> Result<ProcessInfo, PlatformError> {
        self.foreground
            .clone()
            .ok_or_else(|| PlatformError::unsupported("foreground query", "mock"))
    }
}
