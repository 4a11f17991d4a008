use {
  poise::serenity_prelude::GuildId,
  serde::Deserialize,
  std::{
    fs,
    path::{
      Path,
      PathBuf
    }
  },
  thiserror::Error
};

const DEFAULT_PRIMARY: u32 = 0xFF9030;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {}: {source}", path.display())]
  Read {
    path:   PathBuf,
    #[source]
    source: std::io::Error
  },
  #[error("failed to parse config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("no discord_token in config and DISCORD_TOKEN is unset")]
  MissingToken,
  #[error("register = \"guild\" needs a non-zero dev_guild")]
  MissingDevGuild
}

/// Where slash commands get registered on startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
  /// One guild only, updates instantly.
  Guild(GuildId),
  Global
}

impl std::fmt::Display for Register {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>
  ) -> std::fmt::Result {
    match self {
      Self::Guild(id) => write!(f, "guild {id}"),
      Self::Global => f.write_str("global")
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RegisterMode {
  #[default]
  Guild,
  Global
}

#[derive(Debug, Deserialize)]
struct TomlConfig {
  discord_token: Option<String>,
  log_level:     Option<String>,
  #[serde(default)]
  register:      RegisterMode,
  dev_guild:     Option<u64>,
  embed_color:   Option<u32>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedColorPalette {
  pub primary: u32
}

#[derive(Debug)]
pub struct ConfigMeta {
  pub discord_token: String,
  pub log_level:     Option<String>,
  pub register:      Register,
  pub embed_colors:  EmbedColorPalette
}

impl ConfigMeta {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source
    })?;

    Self::from_toml(&content, std::env::var("DISCORD_TOKEN").ok())
  }

  /// `env_token` is only consulted when the file's token is missing or blank.
  pub fn from_toml(
    content: &str,
    env_token: Option<String>
  ) -> Result<Self, ConfigError> {
    let raw: TomlConfig = toml::from_str(content)?;

    let discord_token = raw
      .discord_token
      .filter(|t| !t.trim().is_empty())
      .or(env_token)
      .filter(|t| !t.trim().is_empty())
      .ok_or(ConfigError::MissingToken)?;

    let register = match raw.register {
      RegisterMode::Global => Register::Global,
      RegisterMode::Guild => match raw.dev_guild {
        Some(id) if id != 0 => Register::Guild(GuildId::new(id)),
        _ => return Err(ConfigError::MissingDevGuild)
      }
    };

    Ok(Self {
      discord_token,
      log_level: raw.log_level,
      register,
      embed_colors: EmbedColorPalette {
        primary: raw.embed_color.unwrap_or(DEFAULT_PRIMARY)
      }
    })
  }
}
