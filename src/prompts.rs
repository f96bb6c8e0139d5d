//! Prompt pattern catalog for the BMAD Method installer.
//!
//! The installer renders its questions with `@clack/prompts`. Each
//! [`PromptRule`] names one question, the case-insensitive pattern that
//! recognises it, and where its answer comes from.
//!
//! The patterns are best-effort approximations of the installer's prompt text
//! and have not been validated against every release. A prompt that none of
//! them recognise surfaces as an unexpected-prompt error; widen a pattern only
//! after checking it against the real installer output.

use crate::InstallerConfig;
use regex::{Regex, RegexBuilder};
use strum::IntoEnumIterator;

/// A configuration value that can answer a prompt.
///
/// Each variant is a typed accessor over [`InstallerConfig`], so the catalog
/// refers to answers as data without string-keyed field lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConfigField {
    /// [`InstallerConfig::user_name`]
    UserName,
    /// [`InstallerConfig::language`]
    Language,
    /// [`InstallerConfig::output_dir`]
    OutputDir,
    /// [`InstallerConfig::modules`], comma separated.
    Modules,
    /// `n` when [`InstallerConfig::skip_agents`] is set, `y` otherwise.
    InstallAgents,
}

impl ConfigField {
    /// Read this field from the config.
    ///
    /// Returns `None` when the config leaves the value unset, in which case
    /// the rule's default answers the prompt.
    pub fn resolve(&self, config: &InstallerConfig) -> Option<String> {
        match self {
            Self::UserName => Some(config.user_name.clone()),
            Self::Language => Some(config.language.clone()),
            Self::OutputDir => Some(config.output_dir.clone()),
            Self::Modules => config.modules.as_ref().map(|modules| modules.join(",")),
            Self::InstallAgents => Some(if config.skip_agents { "n" } else { "y" }.to_string()),
        }
    }

    /// Iterator over all answerable fields.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }
}

/// Where a rule's answer comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Answer with a config value, falling back to the rule default.
    Field(ConfigField),
    /// Always answer with the rule default.
    Literal,
}

/// One known installer prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptRule {
    /// Stable rule name, recorded in the response log.
    pub name: &'static str,
    /// Regex recognising the prompt, matched case-insensitively.
    pub pattern: &'static str,
    /// Where the answer comes from.
    pub source: ResponseSource,
    /// Answer used for literal rules and unset fields. Empty means Enter.
    pub default: &'static str,
}

impl PromptRule {
    /// The line to send in reply to this prompt.
    pub fn response(&self, config: &InstallerConfig) -> String {
        match self.source {
            ResponseSource::Field(field) => field
                .resolve(config)
                .unwrap_or_else(|| self.default.to_string()),
            ResponseSource::Literal => self.default.to_string(),
        }
    }
}

/// The BMAD installer prompts, in match-priority order.
pub const PROMPT_RULES: &[PromptRule] = &[
    PromptRule {
        name: "user_name",
        pattern: r"(?:What is your name|Enter your name|name\?)",
        source: ResponseSource::Field(ConfigField::UserName),
        default: "Developer",
    },
    PromptRule {
        name: "language",
        pattern: r"(?:communication language|language preference|language\?)",
        source: ResponseSource::Field(ConfigField::Language),
        default: "English",
    },
    PromptRule {
        name: "output_dir",
        pattern: r"(?:output (?:folder|directory)|where.*output|_bmad-output)",
        source: ResponseSource::Field(ConfigField::OutputDir),
        default: "_bmad-output",
    },
    PromptRule {
        name: "confirm_install",
        pattern: r"(?:proceed|continue|confirm|install\?|y/n)",
        source: ResponseSource::Literal,
        default: "",
    },
    PromptRule {
        name: "select_modules",
        pattern: r"(?:select.*modules|which modules|modules to install)",
        source: ResponseSource::Field(ConfigField::Modules),
        default: "",
    },
    PromptRule {
        name: "quick_update",
        pattern: r"(?:quick.?update|already installed|update existing)",
        source: ResponseSource::Literal,
        default: "",
    },
    PromptRule {
        name: "install_agents",
        pattern: r"(?:install (?:the )?agents|include agents)",
        source: ResponseSource::Field(ConfigField::InstallAgents),
        default: "y",
    },
];

/// Rule name of the quick-update prompt.
pub(crate) const QUICK_UPDATE_RULE: &str = "quick_update";

/// Where a rule matched inside a block of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptMatch {
    /// Position of the rule in the table.
    pub rule: usize,
    /// Byte offset where the match starts.
    pub start: usize,
    /// Byte offset just past the match.
    pub end: usize,
}

/// An ordered, compiled set of [`PromptRule`]s.
///
/// Rules are addressed by position: index `i` is the `i`-th rule of the
/// catalog the table was built from.
#[derive(Debug, Clone)]
pub struct PromptTable {
    rules: Vec<(PromptRule, Regex)>,
}

impl PromptTable {
    /// Compile a table from a rule catalog.
    pub fn new(rules: &[PromptRule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|rule| {
                RegexBuilder::new(rule.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (*rule, re))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// The table for the BMAD installer ([`PROMPT_RULES`]).
    pub fn standard() -> Self {
        Self::new(PROMPT_RULES).expect("Invalid built-in prompt pattern")
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rule at `index`, if the index names one.
    pub fn get(&self, index: usize) -> Option<&PromptRule> {
        self.rules.get(index).map(|(rule, _)| rule)
    }

    /// Rule names in table order.
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|(rule, _)| rule.name).collect()
    }

    /// Find the first prompt in `text`.
    ///
    /// The match starting earliest wins; when two rules match at the same
    /// offset the one earlier in the table wins.
    pub fn find(&self, text: &str) -> Option<PromptMatch> {
        self.rules
            .iter()
            .enumerate()
            .filter_map(|(rule, (_, re))| {
                re.find(text).map(|m| PromptMatch {
                    rule,
                    start: m.start(),
                    end: m.end(),
                })
            })
            .min_by_key(|m| (m.start, m.rule))
    }
}

impl Default for PromptTable {
    fn default() -> Self {
        Self::standard()
    }
}
