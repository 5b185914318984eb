mod builtin;
mod config;
mod logger;
mod permissions;
mod reconciler;
mod roles;
mod state;
mod store;

/// Path of the default config.toml file.
const DEFAULT_CONFIG: &str = "./config.toml";

use crate::reconciler::MemberSink;
use crate::state::State;

use async_trait::async_trait;
use clap::{App, Arg};
use serenity::client::bridge::gateway::GatewayIntents;
use serenity::client::{Client, Context, EventHandler};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::guild::Member;
use serenity::model::id::GuildId;

use std::sync::{Arc, RwLock};
use std::time::Instant;

#[tokio::main]
async fn main() {
    let matches = App::new("rolekeeper")
        .version("0.1.0")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Provide a path to the config file")
                .takes_value(true),
        )
        .get_matches();

    let config = matches.value_of("config").unwrap_or(DEFAULT_CONFIG);

    // Load the config.toml file.
    let config = config::from_file(config);

    logger::init(&config);

    let gateway_intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS | GatewayIntents::GUILD_MESSAGES;

    let mut state = State::new();

    // Connect the store and set up its schema.
    state
        .store_mut()
        .connect(&config.database.connect_string())
        .await
        .unwrap();
    state.store().create().await.unwrap();

    log::info!("[STORE] Store ready");

    state.config = Arc::new(RwLock::new(config.clone()));

    let state = Arc::new(state);

    log::info!("[BOT] Connecting");

    let mut client = Client::builder(&config.token)
        .intents(gateway_intents)
        .event_handler(Handler { state })
        .await
        .unwrap();

    client.start().await.unwrap();
}

pub struct Handler {
    state: Arc<State>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn guild_member_addition(&self, ctx: Context, guild_id: GuildId, member: Member) {
        log::info!("[BOT] Member {} joined guild {}", member.user.id, guild_id);

        let user_id = member.user.id;
        let mut sink = MemberSink::new(&ctx, member);

        self.state
            .reconciler()
            .member_joined(guild_id, user_id, &mut sink)
            .await;
    }

    async fn message(&self, ctx: Context, message: Message) {
        if message.author.bot {
            return;
        }

        let msg = match message.content.strip_prefix('!') {
            Some(msg) => msg,
            None => return,
        };

        let mut parts = msg.split_whitespace();

        let name = match parts.next() {
            Some(name) => name,
            None => return,
        };

        let args: Vec<&str> = parts.collect();

        let res = match name {
            "add" => builtin::add(&ctx, &message, &self.state, &args).await,
            "help" => builtin::help(&ctx, &message).await,
            "ping" => builtin::ping(&ctx, &message).await,
            "uptime" => builtin::uptime(&ctx, &message, &self.state).await,
            _ => return,
        };

        if let Err(err) = res {
            log::error!("Command '{}' returned an error: {:?}", name, err);

            let _ = message
                .channel_id
                .say(&ctx.http, ":warning: Internal Server Error")
                .await;
        }
    }

    async fn ready(&self, _ctx: Context, _ready: Ready) {
        log::info!("[BOT] Bot online");

        let mut connect_time = self.state.connect_time.write().unwrap();
        *connect_time = Some(Instant::now());
    }
}
