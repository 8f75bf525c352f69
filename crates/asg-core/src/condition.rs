//! Predicate strings for `if` nodes.
//!
//! A condition is `<tag>:<argument>`. Parsing always succeeds: a known tag
//! with unusable arguments becomes [`Predicate::Malformed`] (false) and an
//! unknown tag becomes [`Predicate::Unknown`] (true).

use std::fmt;
use std::path::{Path, PathBuf};

use crate::action::MouseButton;
use crate::context::ExecutionContext;
use crate::input::InputDriver;
use crate::settings::EngineSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    WindowExists(String),
    PixelColor { x: i32, y: i32, expected: String },
    ImageExists(PathBuf),
    FindImageAndMove(PathBuf),
    FindImageAndClick { path: PathBuf, button: MouseButton },
    Malformed { tag: &'static str, reason: String },
    Unknown(String),
}

impl Predicate {
    pub fn parse(condition: &str) -> Self {
        if let Some(name) = condition.strip_prefix("window_exists:") {
            return Self::WindowExists(name.to_string());
        }
        if let Some(args) = condition.strip_prefix("pixel_color:") {
            return parse_pixel(args);
        }
        if let Some(path) = condition.strip_prefix("image_exists:") {
            return Self::ImageExists(PathBuf::from(path.trim()));
        }
        if let Some(path) = condition.strip_prefix("find_image_and_move:") {
            return Self::FindImageAndMove(PathBuf::from(path.trim()));
        }
        if let Some(args) = condition.strip_prefix("find_image_and_click:") {
            // Trailing `,<button>` only when it names a button (empty means left);
            // otherwise the comma belongs to the path.
            let (path, button) = match args
                .rsplit_once(',')
                .and_then(|(path, b)| Some((path, MouseButton::parse(b)?)))
            {
                Some(split) => split,
                None => (args, MouseButton::Left),
            };
            return Self::FindImageAndClick {
                path: PathBuf::from(path.trim()),
                button,
            };
        }
        Self::Unknown(condition.to_string())
    }
}

fn parse_pixel(args: &str) -> Predicate {
    let malformed = |reason: String| Predicate::Malformed { tag: "pixel_color", reason };
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let [x, y, expected] = parts.as_slice() else {
        return malformed(format!("expected <x>,<y>,<hex>, got {} argument(s)", parts.len()));
    };
    let (Ok(x), Ok(y)) = (x.parse::<i32>(), y.parse::<i32>()) else {
        return malformed(format!("coordinates must be integers: {x:?}, {y:?}"));
    };
    Predicate::PixelColor {
        x,
        y,
        expected: expected.trim_start_matches('#').to_string(),
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WindowExists(name) => write!(f, "window_exists({name:?})"),
            Self::PixelColor { x, y, expected } => write!(f, "pixel_color({x}, {y}) == {expected}"),
            Self::ImageExists(p) => write!(f, "image_exists({})", p.display()),
            Self::FindImageAndMove(p) => write!(f, "find_image_and_move({})", p.display()),
            Self::FindImageAndClick { path, button } => {
                write!(f, "find_image_and_click({}, {button})", path.display())
            }
            Self::Malformed { tag, reason } => write!(f, "malformed {tag}: {reason}"),
            Self::Unknown(raw) => write!(f, "unknown({raw:?})"),
        }
    }
}

/// Evaluate a raw condition string. Never fails: lookup errors count as false.
pub fn evaluate(
    condition: &str,
    driver: &mut dyn InputDriver,
    settings: &EngineSettings,
    ctx: &mut ExecutionContext,
) -> bool {
    evaluate_predicate(&Predicate::parse(condition), driver, settings, ctx)
}

pub fn evaluate_predicate(
    predicate: &Predicate,
    driver: &mut dyn InputDriver,
    settings: &EngineSettings,
    ctx: &mut ExecutionContext,
) -> bool {
    match predicate {
        Predicate::WindowExists(name) => match driver.process_names() {
            Ok(names) => names.iter().any(|n| n.eq_ignore_ascii_case(name)),
            Err(e) => {
                log::warn!("window_exists: process listing failed: {e:#}");
                false
            }
        },
        Predicate::PixelColor { x, y, expected } => match driver.pixel_color(*x, *y) {
            Ok(actual) => actual.eq_ignore_ascii_case(expected),
            Err(e) => {
                log::warn!("pixel_color: read at ({x}, {y}) failed: {e:#}");
                false
            }
        },
        Predicate::ImageExists(path) => as_condition(locate_image(driver, path, ctx)),
        Predicate::FindImageAndMove(path) => as_condition(move_to_image(driver, path, ctx)),
        Predicate::FindImageAndClick { path, button } => {
            as_condition(click_image(driver, path, *button, settings, ctx))
        }
        Predicate::Malformed { tag, reason } => {
            log::warn!("Malformed {tag} condition: {reason}");
            false
        }
        Predicate::Unknown(raw) => {
            log::warn!("Unknown condition {raw:?}, treating as true");
            true
        }
    }
}

fn as_condition(result: anyhow::Result<bool>) -> bool {
    result.unwrap_or_else(|e| {
        log::warn!("Image search failed: {e:#}");
        false
    })
}

// ── Image helpers shared with the find_image* actions ─────────────────────

/// Search the screen for `path`, remembering the result in `ctx`.
pub fn locate_image(
    driver: &mut dyn InputDriver,
    path: &Path,
    ctx: &mut ExecutionContext,
) -> anyhow::Result<bool> {
    ctx.last_image = None;
    let found = driver.locate_image(path)?;
    ctx.last_image = found;
    match found {
        Some((x, y)) => log::info!("Found {} at ({x}, {y})", path.display()),
        None => log::info!("{} not visible", path.display()),
    }
    Ok(found.is_some())
}

pub fn move_to_image(
    driver: &mut dyn InputDriver,
    path: &Path,
    ctx: &mut ExecutionContext,
) -> anyhow::Result<bool> {
    if !locate_image(driver, path, ctx)? {
        return Ok(false);
    }
    if let Some((x, y)) = ctx.last_image {
        driver.move_to(x, y)?;
    }
    Ok(true)
}

pub fn click_image(
    driver: &mut dyn InputDriver,
    path: &Path,
    button: MouseButton,
    settings: &EngineSettings,
    ctx: &mut ExecutionContext,
) -> anyhow::Result<bool> {
    if !move_to_image(driver, path, ctx)? {
        return Ok(false);
    }
    std::thread::sleep(settings.image_click_settle());
    driver.click(button)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{InputCall, MockDriver};

    fn settings() -> EngineSettings {
        EngineSettings { image_click_settle_ms: 0, ..EngineSettings::default() }
    }

    fn eval(condition: &str, driver: &mut MockDriver) -> bool {
        evaluate(condition, driver, &settings(), &mut ExecutionContext::default())
    }

    #[test]
    fn parses_known_tags() {
        assert_eq!(Predicate::parse("window_exists:Safari"), Predicate::WindowExists("Safari".into()));
        assert_eq!(
            Predicate::parse("pixel_color:10, 20,#FF00aa"),
            Predicate::PixelColor { x: 10, y: 20, expected: "FF00aa".into() }
        );
        assert_eq!(
            Predicate::parse("find_image_and_click:ok.png,right"),
            Predicate::FindImageAndClick { path: "ok.png".into(), button: MouseButton::Right }
        );
        assert_eq!(
            Predicate::parse("find_image_and_click:ok.png,"),
            Predicate::FindImageAndClick { path: "ok.png".into(), button: MouseButton::Left }
        );
        assert_eq!(
            Predicate::parse("find_image_and_click:ok.png, "),
            Predicate::FindImageAndClick { path: "ok.png".into(), button: MouseButton::Left }
        );
        assert_eq!(
            Predicate::parse("find_image_and_click:a,b.png"),
            Predicate::FindImageAndClick { path: "a,b.png".into(), button: MouseButton::Left }
        );
    }

    #[test]
    fn tags_are_case_sensitive() {
        assert!(matches!(Predicate::parse("Window_Exists:x"), Predicate::Unknown(_)));
    }

    #[test]
    fn unknown_condition_is_true() {
        let mut driver = MockDriver::new();
        assert!(eval("anything_unrecognized", &mut driver));
        assert!(eval("", &mut driver));
        assert!(driver.calls.is_empty());
    }

    #[test]
    fn window_exists_matches_case_insensitively() {
        let mut driver = MockDriver::new().with_processes(&["Safari", "Finder"]);
        assert!(eval("window_exists:safari", &mut driver));
        assert!(!eval("window_exists:Mail", &mut driver));
    }

    #[test]
    fn window_exists_is_false_when_listing_fails() {
        let mut driver = MockDriver::new().without_process_list();
        assert!(!eval("window_exists:Safari", &mut driver));
    }

    #[test]
    fn pixel_color_compares_case_insensitively() {
        let mut driver = MockDriver::new().with_pixel(10, 10, "ff00aa");
        assert!(eval("pixel_color:10,10,FF00AA", &mut driver));
        assert!(!eval("pixel_color:10,10,bad", &mut driver));
    }

    #[test]
    fn malformed_pixel_condition_is_false_without_probing() {
        let mut driver = MockDriver::new().with_pixel(10, 10, "ff00aa");
        assert!(!eval("pixel_color:10,10", &mut driver));
        assert!(!eval("pixel_color:ten,10,ff00aa", &mut driver));
        assert!(!eval("pixel_color:1,2,3,4", &mut driver));
        assert!(driver.calls.is_empty());
    }

    #[test]
    fn pixel_read_failure_is_false() {
        let mut driver = MockDriver::new();
        assert!(!eval("pixel_color:1,1,000000", &mut driver));
    }

    #[test]
    fn image_exists_records_last_location() {
        let mut driver = MockDriver::new().with_image("ok.png", (30, 40));
        let mut ctx = ExecutionContext::default();
        assert!(evaluate("image_exists:ok.png", &mut driver, &settings(), &mut ctx));
        assert_eq!(ctx.last_image, Some((30, 40)));
        assert!(!evaluate("image_exists:gone.png", &mut driver, &settings(), &mut ctx));
        assert_eq!(ctx.last_image, None);
        assert!(driver.input_calls().is_empty());
    }

    #[test]
    fn find_image_and_click_moves_then_clicks() {
        let mut driver = MockDriver::new().with_image("ok.png", (5, 6));
        assert!(eval("find_image_and_click:ok.png,right", &mut driver));
        assert_eq!(
            driver.input_calls(),
            vec![InputCall::Move(5, 6), InputCall::Click(MouseButton::Right)]
        );
    }

    #[test]
    fn find_image_and_click_with_trailing_comma_clicks_left() {
        let mut driver = MockDriver::new().with_image("ok.png", (7, 8));
        assert!(eval("find_image_and_click:ok.png,", &mut driver));
        assert_eq!(
            driver.input_calls(),
            vec![InputCall::Move(7, 8), InputCall::Click(MouseButton::Left)]
        );
    }

    #[test]
    fn find_image_and_move_does_nothing_when_missing() {
        let mut driver = MockDriver::new();
        assert!(!eval("find_image_and_move:missing.png", &mut driver));
        assert!(driver.input_calls().is_empty());
    }
}
