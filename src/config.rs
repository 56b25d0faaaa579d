use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_FILE_NAME: &str = "shoplist.log";
const APP_NAME: &str = "shoplist";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub struct Config {
    /// Where the configuration was read from, or would have been.
    pub config_path: PathBuf,
    pub keys: Keys,
    pub ui: UiConfig,
    pub log: LogConfig,
}

#[cfg(test)]
impl Config {
    /// Default bindings and colors without touching the filesystem.
    pub fn for_tests() -> Self {
        Self {
            config_path: PathBuf::from("config.toml"),
            keys: Keys::default(),
            ui: UiConfig {
                colors: UiColors::default(),
            },
            log: LogConfig {
                level: "info".into(),
                file: PathBuf::from("shoplist.log"),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive handed to the tracing subscriber (e.g. "debug").
    pub level: String,
    pub file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub editing_fg: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

// =============================================================================
// Key Bindings - Context-aware with multiple bindings per action
// =============================================================================

/// All key bindings organized by context
#[derive(Debug, Clone, Default)]
pub struct Keys {
    /// Keys that work whenever no dialog or editor has focus
    pub global: GlobalKeys,
    /// Keys for moving through the list and acting on the selected item
    pub list: ListKeys,
    /// Keys for the add-item dialog
    pub dialog: DialogKeys,
    /// Keys for the inline item editor
    pub editor: EditorKeys,
}

#[derive(Debug, Clone)]
pub struct GlobalKeys {
    pub quit: Vec<String>,
    pub help: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ListKeys {
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub add: Vec<String>,
    pub edit: Vec<String>,
    pub delete: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DialogKeys {
    pub cancel: Vec<String>,
    pub confirm: Vec<String>,
    pub next_field: Vec<String>,
    pub prev_field: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EditorKeys {
    pub confirm: Vec<String>,
    pub next_field: Vec<String>,
    pub prev_field: Vec<String>,
    /// Row actions stay reachable while a draft is open; bound to keys that
    /// never produce text.
    pub next_item: Vec<String>,
    pub prev_item: Vec<String>,
    pub edit_item: Vec<String>,
    pub delete_item: Vec<String>,
}

// =============================================================================
// Default implementations
// =============================================================================

impl Default for GlobalKeys {
    fn default() -> Self {
        Self {
            quit: vec!["q".into()],
            help: vec!["F1".into(), "?".into()],
        }
    }
}

impl Default for ListKeys {
    fn default() -> Self {
        Self {
            next: vec!["j".into(), "Down".into()],
            prev: vec!["k".into(), "Up".into()],
            add: vec!["a".into(), "+".into()],
            edit: vec!["e".into(), "Enter".into()],
            delete: vec!["x".into(), "Delete".into()],
        }
    }
}

impl Default for DialogKeys {
    fn default() -> Self {
        Self {
            cancel: vec!["Escape".into()],
            confirm: vec!["Enter".into()],
            next_field: vec!["Tab".into(), "Down".into()],
            prev_field: vec!["Backtab".into(), "Up".into()],
        }
    }
}

impl Default for EditorKeys {
    fn default() -> Self {
        Self {
            confirm: vec!["Enter".into()],
            next_field: vec!["Tab".into()],
            prev_field: vec!["Backtab".into()],
            next_item: vec!["Down".into()],
            prev_item: vec!["Up".into()],
            edit_item: vec!["F2".into()],
            delete_item: vec!["F8".into()],
        }
    }
}

impl Default for UiColors {
    fn default() -> Self {
        Self {
            border: RgbColor::new(24, 49, 201),
            selection_bg: RgbColor::new(24, 49, 201),
            selection_fg: RgbColor::new(255, 255, 255),
            editing_fg: RgbColor::new(224, 78, 34),
            status_fg: RgbColor::new(24, 49, 201),
            status_bg: RgbColor::new(0, 0, 0),
        }
    }
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

// =============================================================================
// Serde deserialization types (support both single string and array)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyBinding {
    Single(String),
    Multiple(Vec<String>),
}

impl KeyBinding {
    fn into_vec(self) -> Vec<String> {
        match self {
            KeyBinding::Single(s) => vec![s],
            KeyBinding::Multiple(v) => v,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct KeysFile {
    global: GlobalKeysFile,
    list: ListKeysFile,
    dialog: DialogKeysFile,
    editor: EditorKeysFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GlobalKeysFile {
    quit: KeyBinding,
    help: KeyBinding,
}

impl Default for GlobalKeysFile {
    fn default() -> Self {
        let defaults = GlobalKeys::default();
        Self {
            quit: KeyBinding::Multiple(defaults.quit),
            help: KeyBinding::Multiple(defaults.help),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ListKeysFile {
    next: KeyBinding,
    prev: KeyBinding,
    add: KeyBinding,
    edit: KeyBinding,
    delete: KeyBinding,
}

impl Default for ListKeysFile {
    fn default() -> Self {
        let defaults = ListKeys::default();
        Self {
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
            add: KeyBinding::Multiple(defaults.add),
            edit: KeyBinding::Multiple(defaults.edit),
            delete: KeyBinding::Multiple(defaults.delete),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DialogKeysFile {
    cancel: KeyBinding,
    confirm: KeyBinding,
    next_field: KeyBinding,
    prev_field: KeyBinding,
}

impl Default for DialogKeysFile {
    fn default() -> Self {
        let defaults = DialogKeys::default();
        Self {
            cancel: KeyBinding::Multiple(defaults.cancel),
            confirm: KeyBinding::Multiple(defaults.confirm),
            next_field: KeyBinding::Multiple(defaults.next_field),
            prev_field: KeyBinding::Multiple(defaults.prev_field),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct EditorKeysFile {
    confirm: KeyBinding,
    next_field: KeyBinding,
    prev_field: KeyBinding,
    next_item: KeyBinding,
    prev_item: KeyBinding,
    edit_item: KeyBinding,
    delete_item: KeyBinding,
}

impl Default for EditorKeysFile {
    fn default() -> Self {
        let defaults = EditorKeys::default();
        Self {
            confirm: KeyBinding::Multiple(defaults.confirm),
            next_field: KeyBinding::Multiple(defaults.next_field),
            prev_field: KeyBinding::Multiple(defaults.prev_field),
            next_item: KeyBinding::Multiple(defaults.next_item),
            prev_item: KeyBinding::Multiple(defaults.prev_item),
            edit_item: KeyBinding::Multiple(defaults.edit_item),
            delete_item: KeyBinding::Multiple(defaults.delete_item),
        }
    }
}

impl From<KeysFile> for Keys {
    fn from(file: KeysFile) -> Self {
        Self {
            global: GlobalKeys {
                quit: file.global.quit.into_vec(),
                help: file.global.help.into_vec(),
            },
            list: ListKeys {
                next: file.list.next.into_vec(),
                prev: file.list.prev.into_vec(),
                add: file.list.add.into_vec(),
                edit: file.list.edit.into_vec(),
                delete: file.list.delete.into_vec(),
            },
            dialog: DialogKeys {
                cancel: file.dialog.cancel.into_vec(),
                confirm: file.dialog.confirm.into_vec(),
                next_field: file.dialog.next_field.into_vec(),
                prev_field: file.dialog.prev_field.into_vec(),
            },
            editor: EditorKeys {
                confirm: file.editor.confirm.into_vec(),
                next_field: file.editor.next_field.into_vec(),
                prev_field: file.editor.prev_field.into_vec(),
                next_item: file.editor.next_item.into_vec(),
                prev_item: file.editor.prev_item.into_vec(),
                edit_item: file.editor.edit_item.into_vec(),
                delete_item: file.editor.delete_item.into_vec(),
            },
        }
    }
}

// =============================================================================
// Key binding validation
// =============================================================================

/// Normalize a key binding string to a canonical form for collision detection.
/// Single characters preserve case (since 'M' means Shift+m, different from 'm').
/// Multi-character key names are case-insensitive (Enter, ENTER, enter are the same).
fn normalize_binding(binding: &str) -> String {
    let trimmed = binding.trim();
    if trimmed.chars().count() == 1 {
        trimmed.to_string()
    } else {
        match trimmed.to_ascii_lowercase().as_str() {
            "esc" => "escape".to_string(),
            "shift+tab" => "backtab".to_string(),
            "del" => "delete".to_string(),
            other => other.to_string(),
        }
    }
}

fn check_context_collisions(bindings: &[(&str, &[String])], context_name: &str) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for (action_name, keys) in bindings {
        for key in *keys {
            let normalized = normalize_binding(key);
            if normalized.is_empty() {
                continue;
            }
            if let Some(existing_action) = seen.get(&normalized) {
                bail!(
                    "key binding collision in [keys.{}]: '{}' is bound to both '{}' and '{}'",
                    context_name,
                    key,
                    existing_action,
                    action_name
                );
            }
            seen.insert(normalized, action_name);
        }
    }

    Ok(())
}

fn validate_key_bindings(keys: &Keys) -> Result<()> {
    // Global keys are live while the list has focus, so they share its context.
    check_context_collisions(
        &[
            ("quit", &keys.global.quit),
            ("help", &keys.global.help),
            ("next", &keys.list.next),
            ("prev", &keys.list.prev),
            ("add", &keys.list.add),
            ("edit", &keys.list.edit),
            ("delete", &keys.list.delete),
        ],
        "list",
    )?;

    check_context_collisions(
        &[
            ("cancel", &keys.dialog.cancel),
            ("confirm", &keys.dialog.confirm),
            ("next_field", &keys.dialog.next_field),
            ("prev_field", &keys.dialog.prev_field),
        ],
        "dialog",
    )?;

    check_context_collisions(
        &[
            ("confirm", &keys.editor.confirm),
            ("next_field", &keys.editor.next_field),
            ("prev_field", &keys.editor.prev_field),
            ("next_item", &keys.editor.next_item),
            ("prev_item", &keys.editor.prev_item),
            ("edit_item", &keys.editor.edit_item),
            ("delete_item", &keys.editor.delete_item),
        ],
        "editor",
    )?;

    Ok(())
}

// =============================================================================
// Config file structure
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    keys: KeysFile,
    ui: UiFile,
    log: LogFile,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    editing_fg: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        let defaults = UiColors::default();
        Self {
            border: defaults.border,
            selection_bg: defaults.selection_bg,
            selection_fg: defaults.selection_fg,
            editing_fg: defaults.editing_fg,
            status_fg: defaults.status_fg,
            status_bg: defaults.status_bg,
        }
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        let colors = file.colors;
        Self {
            colors: UiColors {
                border: colors.border,
                selection_bg: colors.selection_bg,
                selection_fg: colors.selection_fg,
                editing_fg: colors.editing_fg,
                status_fg: colors.status_fg,
                status_bg: colors.status_bg,
            },
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct LogFile {
    level: Option<String>,
    file: Option<PathBuf>,
}

impl LogFile {
    fn into_config(self) -> Result<LogConfig> {
        let level = self
            .level
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let file = match self.file {
            Some(path) => expand_tilde(&path),
            None => default_log_path()?,
        };

        Ok(LogConfig { level, file })
    }
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn base_dirs() -> Result<BaseDirs> {
    BaseDirs::new().context("unable to determine base directories")
}

pub fn config_path() -> Result<PathBuf> {
    Ok(base_dirs()?
        .config_dir()
        .join(APP_NAME)
        .join(CONFIG_FILE_NAME))
}

fn default_log_path() -> Result<PathBuf> {
    Ok(base_dirs()?
        .data_local_dir()
        .join(APP_NAME)
        .join(LOG_FILE_NAME))
}

/// Load the configuration. An explicit path must exist; the default location
/// may be absent, in which case every setting takes its default.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            let path = expand_tilde(path);
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path
        }
        None => config_path()?,
    };

    if !path.exists() {
        return parse("", path);
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    parse(&raw, path)
}

fn parse(raw: &str, path: PathBuf) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    for warning in unknown_keys(&value) {
        eprintln!("warning: {}", warning);
    }

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    let keys: Keys = cfg_file.keys.into();
    validate_key_bindings(&keys)?;

    let log = cfg_file
        .log
        .into_config()
        .context("failed to resolve [log] configuration")?;

    Ok(Config {
        config_path: path,
        keys,
        ui: cfg_file.ui.into(),
        log,
    })
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn unknown_keys(value: &toml::Value) -> Vec<String> {
    let mut warnings = Vec::new();
    let Some(table) = value.as_table() else {
        return warnings;
    };

    collect_unknown(value, "configuration key", &["keys", "ui", "log"], &mut warnings);

    if let Some(keys) = table.get("keys") {
        collect_unknown(
            keys,
            "keys section",
            &["global", "list", "dialog", "editor"],
            &mut warnings,
        );
        let contexts: [(&str, &[&str]); 4] = [
            ("global", &["quit", "help"][..]),
            ("list", &["next", "prev", "add", "edit", "delete"][..]),
            ("dialog", &["cancel", "confirm", "next_field", "prev_field"][..]),
            (
                "editor",
                &[
                    "confirm",
                    "next_field",
                    "prev_field",
                    "next_item",
                    "prev_item",
                    "edit_item",
                    "delete_item",
                ][..],
            ),
        ];
        for (context, known) in contexts {
            if let Some(section) = keys.get(context) {
                collect_unknown(
                    section,
                    &format!("keys.{} entry", context),
                    known,
                    &mut warnings,
                );
            }
        }
    }

    if let Some(ui) = table.get("ui") {
        collect_unknown(ui, "ui entry", &["colors"], &mut warnings);
        if let Some(colors) = ui.get("colors") {
            collect_unknown(
                colors,
                "ui.colors entry",
                &[
                    "border",
                    "selection_bg",
                    "selection_fg",
                    "editing_fg",
                    "status_fg",
                    "status_bg",
                ],
                &mut warnings,
            );
        }
    }

    if let Some(log) = table.get("log") {
        collect_unknown(log, "log entry", &["level", "file"], &mut warnings);
    }

    warnings
}

fn collect_unknown(value: &toml::Value, what: &str, known: &[&str], out: &mut Vec<String>) {
    let Some(table) = value.as_table() else {
        return;
    };
    let known: HashSet<&str> = known.iter().copied().collect();
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            out.push(format!("unknown {} `{}`", what, key));
        }
    }
}
