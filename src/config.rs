// src/config.rs  —  Runtime configuration (CLI + TOML)
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// The example config is embedded directly in the binary at compile time.
/// Users can write it out with:  barcode-bridge --write-config
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config.toml.example");

/// Symbol Bar Code Scanner
pub const DEFAULT_VID: u16 = 0x05E0;
pub const DEFAULT_PID: u16 = 0x1200;

pub const BARCODE_PLACEHOLDER: &str = "{barcode}";

pub const DEFAULT_URL_TEMPLATE: &str =
    "https://lms.3shape.com/pages/admin/case_list.asp?page=case_search_result&cmd=search_result&searchbox_text={barcode}";

pub const DEFAULT_KEYBOARD_COMMAND: &str = "##MODE-KEYBOARD##";
pub const DEFAULT_URL_COMMAND:      &str = "##MODE-URL##";

// ── CLI ───────────────────────────────────────────────────────────────────────
#[derive(Parser, Debug, Default)]
#[command(
    name    = "barcode-bridge",
    about   = "USB barcode scanner → browser / keyboard bridge",
    version,
)]
pub struct Cli {
    /// Config file path (default: ~/.config/barcode-bridge/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Scanner USB vendor id, hex (default: 05e0)
    #[arg(long, value_parser = parse_hex_u16)]
    pub vid: Option<u16>,

    /// Scanner USB product id, hex (default: 1200)
    #[arg(long, value_parser = parse_hex_u16)]
    pub pid: Option<u16>,

    /// Start in this mode (persisted): keyboard | url
    #[arg(long)]
    pub mode: Option<OperatingMode>,

    /// Persist this mode and exit: keyboard | url
    #[arg(long)]
    pub set_mode: Option<OperatingMode>,

    /// URL template; {barcode} is replaced by the scanned code
    #[arg(long)]
    pub url_template: Option<String>,

    /// Substitute the barcode into the URL verbatim (no percent-encoding)
    #[arg(long, action)]
    pub raw_url: bool,

    /// Settings file path (default: next to config.toml)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Log what would be opened / typed instead of doing it
    #[arg(long, action)]
    pub dry_run: bool,

    /// List connected HID devices and exit
    #[arg(long, action)]
    pub list_devices: bool,

    /// Open the scanner, wait for one scan and print it (nothing is dispatched)
    #[arg(long, action)]
    pub check_scanner: bool,

    /// Write the built-in default config.toml to the config path and exit.
    /// Use --config <PATH> to write to a custom location.
    #[arg(long, action)]
    pub write_config: bool,

    /// Print the built-in default config.toml to stdout and exit
    #[arg(long, action)]
    pub print_config: bool,
}

fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|e| format!("'{s}' is not a hex u16: {e}"))
}

// ── Enums shared across CLI + TOML + settings ─────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum OperatingMode {
    /// Type the scanned text into the focused window, then Enter
    #[serde(rename = "keyboard")]
    #[value(name = "keyboard")]
    KeyboardPassthrough,
    /// Open the URL template with the barcode in the default browser
    #[serde(rename = "url")]
    #[value(name = "url")]
    OpenUrl,
}

impl OperatingMode {
    pub fn as_u8(self) -> u8 {
        match self {
            OperatingMode::KeyboardPassthrough => 0,
            OperatingMode::OpenUrl             => 1,
        }
    }

    pub fn from_u8(v: u8) -> Self {
        if v == 0 { OperatingMode::KeyboardPassthrough } else { OperatingMode::OpenUrl }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperatingMode::KeyboardPassthrough => "keyboard",
            OperatingMode::OpenUrl             => "url",
        })
    }
}

// ── TOML file structure ───────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    pub device:    Option<DeviceCfg>,
    pub dispatch:  Option<DispatchCfg>,
    /// `[[auto_mode]]` entries — foreground window title → forced mode
    pub auto_mode: Option<Vec<AutoModeRule>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCfg {
    pub vendor_id:            Option<u16>,
    pub product_id:           Option<u16>,
    /// Bounded interrupt read (ms)
    pub read_timeout_ms:      Option<u64>,
    /// Wait between reconnect attempts (ms)
    pub reconnect_backoff_ms: Option<u64>,
    /// Keystroke gap that abandons a partial barcode (ms)
    pub idle_timeout_ms:      Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchCfg {
    pub default_mode:     Option<OperatingMode>,
    pub url_template:     Option<String>,
    pub encode_barcode:   Option<bool>,
    pub keyboard_command: Option<String>,
    pub url_command:      Option<String>,
    pub settings_path:    Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoModeRule {
    /// Exact window title
    pub title: String,
    pub mode:  OperatingMode,
}

// ── Resolved / merged config ──────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub vid:               u16,
    pub pid:               u16,
    pub read_timeout:      Duration,
    pub reconnect_backoff: Duration,
    pub idle_timeout:      Duration,
    /// Mode used when nothing is persisted yet
    pub default_mode:      OperatingMode,
    /// Mode forced from the CLI (--mode)
    pub start_mode:        Option<OperatingMode>,
    pub url_template:      String,
    /// Percent-encode the barcode before substitution
    pub encode_barcode:    bool,
    pub keyboard_command:  String,
    pub url_command:       String,
    pub auto_modes:        Vec<AutoModeRule>,
    pub settings_path:     PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vid:               DEFAULT_VID,
            pid:               DEFAULT_PID,
            read_timeout:      Duration::from_millis(100),
            reconnect_backoff: Duration::from_secs(2),
            idle_timeout:      crate::scan::assembler::IDLE_TIMEOUT,
            default_mode:      OperatingMode::OpenUrl,
            start_mode:        None,
            url_template:      DEFAULT_URL_TEMPLATE.into(),
            encode_barcode:    true,
            keyboard_command:  DEFAULT_KEYBOARD_COMMAND.into(),
            url_command:       DEFAULT_URL_COMMAND.into(),
            auto_modes:        default_auto_modes(),
            settings_path:     default_settings_path(),
        }
    }
}

/// Applications that want the scan typed rather than opened in a browser.
fn default_auto_modes() -> Vec<AutoModeRule> {
    vec![
        AutoModeRule { title: "3Shape Dental System".into(), mode: OperatingMode::KeyboardPassthrough },
        AutoModeRule { title: "Dental Desktop".into(),       mode: OperatingMode::KeyboardPassthrough },
    ]
}

// ── Config loader ─────────────────────────────────────────────────────────────
impl AppConfig {
    /// Write the embedded default config to disk.
    /// Returns the path it was written to.
    pub fn write_default_config(cli: &Cli) -> Result<PathBuf> {
        let path = cli.config.clone().unwrap_or_else(default_config_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Creating config directory {:?}", parent))?;
        }
        std::fs::write(&path, DEFAULT_CONFIG_TOML)
            .with_context(|| format!("Writing config to {:?}", path))?;
        Ok(path)
    }

    pub fn load(cli: &Cli) -> Result<Self> {
        let mut cfg = Self::default();

        // 1. Load TOML file
        let path = cli.config.clone().unwrap_or_else(default_config_path);
        if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Reading config {:?}", path))?;
            let fc: FileConfig = toml::from_str(&raw)
                .with_context(|| format!("Parsing config {:?}", path))?;
            cfg.apply_file(&fc);
        } else {
            log::info!(
                "No config file at {} — using built-in defaults \
                 (`barcode-bridge --write-config` creates one)",
                path.display()
            );
        }

        // 2. Apply CLI overrides
        cfg.apply_cli(cli);
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_file(&mut self, fc: &FileConfig) {
        if let Some(d) = &fc.device {
            if let Some(v) = d.vendor_id            { self.vid               = v; }
            if let Some(v) = d.product_id           { self.pid               = v; }
            if let Some(v) = d.read_timeout_ms      { self.read_timeout      = Duration::from_millis(v); }
            if let Some(v) = d.reconnect_backoff_ms { self.reconnect_backoff = Duration::from_millis(v); }
            if let Some(v) = d.idle_timeout_ms      { self.idle_timeout      = Duration::from_millis(v); }
        }
        if let Some(p) = &fc.dispatch {
            if let Some(v) = p.default_mode      { self.default_mode     = v; }
            if let Some(v) = &p.url_template     { self.url_template     = v.clone(); }
            if let Some(v) = p.encode_barcode    { self.encode_barcode   = v; }
            if let Some(v) = &p.keyboard_command { self.keyboard_command = v.clone(); }
            if let Some(v) = &p.url_command      { self.url_command      = v.clone(); }
            if let Some(v) = &p.settings_path    { self.settings_path    = v.clone(); }
        }
        if let Some(rules) = &fc.auto_mode {
            self.auto_modes = rules.clone();
        }
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = cli.vid           { self.vid           = v; }
        if let Some(v) = cli.pid           { self.pid           = v; }
        if let Some(v) = cli.mode          { self.start_mode    = Some(v); }
        if let Some(v) = &cli.url_template { self.url_template  = v.clone(); }
        if cli.raw_url                     { self.encode_barcode = false; }
        if let Some(v) = &cli.settings     { self.settings_path = v.clone(); }
    }

    fn validate(&self) -> Result<()> {
        if !self.url_template.contains(BARCODE_PLACEHOLDER) {
            bail!("url_template must contain {BARCODE_PLACEHOLDER}: {:?}", self.url_template);
        }
        if self.keyboard_command.is_empty() || self.url_command.is_empty() {
            bail!("command barcodes must not be empty");
        }
        if self.keyboard_command == self.url_command {
            bail!("keyboard_command and url_command must differ ({:?})", self.url_command);
        }
        if self.read_timeout.is_zero() {
            bail!("device.read_timeout_ms must be > 0");
        }
        if self.reconnect_backoff.is_zero() {
            bail!("device.reconnect_backoff_ms must be > 0");
        }
        Ok(())
    }
}

fn default_config_path() -> PathBuf {
    dirs_next().join("barcode-bridge").join("config.toml")
}

fn default_settings_path() -> PathBuf {
    dirs_next().join("barcode-bridge").join("settings.json")
}

fn dirs_next() -> PathBuf {
    if let Ok(v) = std::env::var("XDG_CONFIG_HOME") { return PathBuf::from(v); }
    if let Ok(v) = std::env::var("APPDATA")          { return PathBuf::from(v); }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_default();
    PathBuf::from(home).join(".config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_config_parses_and_matches_defaults() {
        let fc: FileConfig = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        let mut cfg = AppConfig::default();
        cfg.apply_file(&fc);
        cfg.validate().unwrap();
        let d = AppConfig::default();
        assert_eq!(cfg.vid, d.vid);
        assert_eq!(cfg.pid, d.pid);
        assert_eq!(cfg.read_timeout, d.read_timeout);
        assert_eq!(cfg.reconnect_backoff, d.reconnect_backoff);
        assert_eq!(cfg.idle_timeout, d.idle_timeout);
        assert_eq!(cfg.url_template, d.url_template);
        assert_eq!(cfg.default_mode, d.default_mode);
        assert_eq!(cfg.auto_modes, d.auto_modes);
    }

    #[test]
    fn file_and_cli_overrides() {
        let fc: FileConfig = toml::from_str(r#"
            [device]
            vendor_id = 0x1234
            idle_timeout_ms = 250

            [dispatch]
            default_mode = "keyboard"
            url_template = "https://example.org/?q={barcode}"

            [[auto_mode]]
            title = "Notepad"
            mode = "url"
        "#).unwrap();
        let mut cfg = AppConfig::default();
        cfg.apply_file(&fc);
        assert_eq!(cfg.vid, 0x1234);
        assert_eq!(cfg.pid, DEFAULT_PID);
        assert_eq!(cfg.idle_timeout, Duration::from_millis(250));
        assert_eq!(cfg.default_mode, OperatingMode::KeyboardPassthrough);
        assert_eq!(cfg.auto_modes, vec![AutoModeRule { title: "Notepad".into(), mode: OperatingMode::OpenUrl }]);

        let cli = Cli::parse_from(["barcode-bridge", "--pid", "0xbeef", "--mode", "url", "--raw-url"]);
        cfg.apply_cli(&cli);
        assert_eq!(cfg.pid, 0xBEEF);
        assert_eq!(cfg.start_mode, Some(OperatingMode::OpenUrl));
        assert!(!cfg.encode_barcode);
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let cfg = AppConfig { url_template: "https://example.org/".into(), ..AppConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn identical_commands_are_rejected() {
        let cfg = AppConfig { url_command: DEFAULT_KEYBOARD_COMMAND.into(), ..AppConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_backoff_is_rejected() {
        let fc: FileConfig = toml::from_str("[device]\nreconnect_backoff_ms = 0\n").unwrap();
        let mut cfg = AppConfig::default();
        cfg.apply_file(&fc);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn hex_ids() {
        assert_eq!(parse_hex_u16("05e0"), Ok(0x05E0));
        assert_eq!(parse_hex_u16("0x1200"), Ok(0x1200));
        assert!(parse_hex_u16("zz").is_err());
    }
}
