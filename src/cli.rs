use std::path::PathBuf;

use clap::Parser;

use crate::list::ScrollConfig;
use crate::settings::ListSettings;
use crate::theme::ThemeVariant;

/// Rows between posts when neither the settings file nor the CLI says otherwise.
pub const DEFAULT_ITEM_GAP: u32 = 1;

#[derive(Parser, Debug)]
#[command(name = "scrollfeed")]
#[command(about = "An infinitely scrolling feed for the terminal", long_about = None)]
pub struct Cli {
    /// Where posts come from: demo or hn
    #[arg(short, long, default_value = "demo")]
    pub source: SourceKind,

    /// Number of posts the demo source holds
    #[arg(long, default_value_t = 200)]
    pub total: usize,

    /// Posts per page
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub page_size: Option<u16>,

    /// Blank rows between posts
    #[arg(long, value_name = "ROWS")]
    pub item_gap: Option<u32>,

    /// Simulated demo latency per page
    #[arg(long, value_name = "MS", default_value_t = 400)]
    pub latency_ms: u64,

    /// Make the demo source fail its first request
    #[arg(long)]
    pub fail_first: bool,

    /// Force dark mode (overrides auto-detection)
    #[arg(long, conflicts_with = "light")]
    pub dark: bool,

    /// Force light mode (overrides auto-detection)
    #[arg(long, conflicts_with = "dark")]
    pub light: bool,

    /// Custom config directory (default: ~/.config/scrollfeed)
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Log file (default: scrollfeed.log in the config directory)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (prints log path, sets DEBUG level)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// List config from defaults, then the settings file, then flags.
    pub fn scroll_config(&self, settings: &ListSettings) -> ScrollConfig {
        let mut config = ScrollConfig {
            item_gap: DEFAULT_ITEM_GAP,
            ..Default::default()
        };
        settings.apply(&mut config);
        if let Some(gap) = self.item_gap {
            config.item_gap = gap;
        }
        if let Some(size) = self.page_size {
            config.items_per_load = usize::from(size);
        }
        config
    }

    /// Theme forced by a flag, if any.
    pub const fn forced_variant(&self) -> Option<ThemeVariant> {
        if self.dark {
            Some(ThemeVariant::Dark)
        } else if self.light {
            Some(ThemeVariant::Light)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceKind {
    #[default]
    Demo,
    Hn,
}

impl SourceKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Demo => "demo",
            Self::Hn => "hacker news",
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "demo" => Ok(Self::Demo),
            "hn" => Ok(Self::Hn),
            _ => Err(format!("Invalid source: {s}. Use 'demo' or 'hn'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("scrollfeed").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.source, SourceKind::Demo);
        assert_eq!(cli.total, 200);
        assert_eq!(cli.latency_ms, 400);
        assert_eq!(cli.forced_variant(), None);

        let config = cli.scroll_config(&ListSettings::default());
        assert_eq!(config.item_gap, DEFAULT_ITEM_GAP);
        assert_eq!(config.items_per_load, ScrollConfig::default().items_per_load);
    }

    #[test]
    fn source_parses_case_insensitively() {
        assert_eq!(parse(&["--source", "HN"]).source, SourceKind::Hn);
        assert!(Cli::try_parse_from(["scrollfeed", "--source", "rss"]).is_err());
    }

    #[test]
    fn flags_beat_settings() {
        let settings = ListSettings {
            item_gap: Some(4),
            items_per_load: Some(30),
            end_of_list_label: Some("done".into()),
            ..Default::default()
        };

        let config = parse(&["--item-gap", "0"]).scroll_config(&settings);

        assert_eq!(config.item_gap, 0);
        assert_eq!(config.items_per_load, 30);
        assert_eq!(config.end_of_list_label, "done");

        let config = parse(&["--page-size", "5"]).scroll_config(&settings);
        assert_eq!(config.item_gap, 4);
        assert_eq!(config.items_per_load, 5);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(Cli::try_parse_from(["scrollfeed", "--page-size", "0"]).is_err());
    }

    #[test]
    fn dark_and_light_conflict() {
        assert!(Cli::try_parse_from(["scrollfeed", "--dark", "--light"]).is_err());
        assert_eq!(
            parse(&["--light"]).forced_variant(),
            Some(ThemeVariant::Light)
        );
    }
}
