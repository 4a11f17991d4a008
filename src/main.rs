mod commands;
mod controllers;
mod errors;
mod events;
mod internals;
mod shutdown;

use {
  controllers::invites::InviteTracker,
  internals::config::{
    ConfigMeta,
    Register
  }
};

use {
  clap::Parser,
  poise::serenity_prelude::{
    ClientBuilder,
    GatewayIntents
  },
  std::{
    path::PathBuf,
    sync::Arc
  },
  tracing::{
    error,
    info
  },
  tracing_subscriber::EnvFilter
};

type BotError = Box<dyn std::error::Error + Send + Sync>;

struct BotData {
  config:      ConfigMeta,
  invite_data: Arc<InviteTracker>
}

/// Discord bot that tracks who invited whom
#[derive(Parser)]
#[command(version, about)]
struct Args {
  /// Path to the TOML config file
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Log at debug level, overriding the config file
  #[arg(long)]
  debug: bool
}

fn init_logging(
  args: &Args,
  config: &ConfigMeta
) {
  let filter = if args.debug {
    EnvFilter::new("debug")
  } else if let Some(level) = config.log_level.as_deref() {
    EnvFilter::new(level)
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("invitetracker=info"))
  };

  tracing_subscriber::fmt().with_env_filter(filter).with_line_number(true).init();
}

#[tokio::main]
async fn main() {
  let args = Args::parse();

  let config = match ConfigMeta::load(&args.config) {
    Ok(c) => c,
    Err(e) => {
      eprintln!("Config[Error] {e}");
      std::process::exit(1);
    }
  };

  init_logging(&args, &config);

  let token = config.discord_token.clone();
  let register = config.register;
  let bot_data = BotData {
    config,
    invite_data: Arc::new(InviteTracker::new())
  };

  let framework = poise::Framework::builder()
    .options(poise::FrameworkOptions {
      commands: commands::collect!(),
      pre_command: |ctx| {
        Box::pin(async move {
          let guild_name = ctx
            .guild()
            .map(|guild| guild.name.clone())
            .unwrap_or_else(|| "Unknown Guild".to_owned());

          info!("Discord[{guild_name}] {} ran /{}", ctx.author().name, ctx.command().qualified_name);
        })
      },
      on_error: |error| Box::pin(errors::fw_errors(error)),
      event_handler: |ctx, event, framework, data| Box::pin(events::dispatch(ctx, event, framework, data)),
      ..Default::default()
    })
    .setup(move |ctx, _ready, framework| {
      Box::pin(async move {
        let commands = &framework.options().commands;
        match register {
          Register::Guild(guild_id) => poise::builtins::register_in_guild(ctx, commands, guild_id).await?,
          Register::Global => poise::builtins::register_globally(ctx, commands).await?
        }

        for command in commands {
          info!("Poise[Setup] Registered /{} ({register})", command.name);
        }

        Ok(bot_data)
      })
    })
    .build();

  let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_INVITES | GatewayIntents::GUILD_MEMBERS;

  let mut client = match ClientBuilder::new(token, intents).framework(framework).await {
    Ok(client) => client,
    Err(e) => {
      error!("Client[Error] Failed to build client: {e}");
      std::process::exit(1);
    }
  };

  let shard_manager = Arc::clone(&client.shard_manager);

  tokio::select! {
    client_result = client.start() => {
      if let Err(why) = client_result {
        error!("Client[Error] {why:?}");
        std::process::exit(1);
      }
    },
    _ = shutdown::gracefully_shutdown() => shard_manager.shutdown_all().await
  }
}
