// tests/command_service_tests.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;

use gibbot_common::models::{ChatMessage, NewUser, PermissionTier};
use gibbot_common::traits::message_sender::MockMessageSender;
use gibbot_common::Error;
use gibbot_core::repositories::sqlite::{command_usage, commands, user};
use gibbot_core::services::builtin_commands::builtin_commands;
use gibbot_core::services::command_registry::{Command, CommandRegistry};
use gibbot_core::services::command_service::{
    CommandContext, CommandHandler, CommandService, Dispatch, Gate,
};
use gibbot_core::Database;

mod test_utils;
use test_utils::{message, provision_channel, setup_test_database};

struct TestHandler {
    calls: Arc<AtomicUsize>,
    fail: bool,
    trigger: Option<&'static str>,
}

#[async_trait]
impl CommandHandler for TestHandler {
    async fn execute(
        &self,
        _ctx: &CommandContext<'_>,
        _msg: &ChatMessage,
        _args: &[String],
    ) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Parse("body failed".to_string()));
        }
        Ok(())
    }

    fn should_run_unprefixed(&self, _msg: &ChatMessage, args: &[String]) -> bool {
        self.trigger
            .map(|t| args.first().map(String::as_str) == Some(t))
            .unwrap_or(false)
    }
}

struct TestCommand {
    name: &'static str,
    channel_cooldown_seconds: i64,
    user_cooldown_seconds: i64,
    no_prefix: bool,
    can_disable: bool,
    fail: bool,
    trigger: Option<&'static str>,
}

impl TestCommand {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            channel_cooldown_seconds: 0,
            user_cooldown_seconds: 0,
            no_prefix: false,
            can_disable: false,
            fail: false,
            trigger: None,
        }
    }

    fn build(self, calls: Arc<AtomicUsize>) -> Command {
        Command {
            name: self.name,
            aliases: &[],
            usage: self.name,
            description: "test command",
            channel_cooldown_seconds: self.channel_cooldown_seconds,
            user_cooldown_seconds: self.user_cooldown_seconds,
            no_prefix: self.no_prefix,
            can_disable: self.can_disable,
            handler: Arc::new(TestHandler {
                calls,
                fail: self.fail,
                trigger: self.trigger,
            }),
        }
    }
}

/// Custom test commands are not part of the built-in list, so their names
/// are mirrored by hand (the startup mirroring only runs against an empty
/// table).
async fn mirror_command(db: &Database, name: &str) -> Result<(), Error> {
    sqlx::query("INSERT INTO commands (command_name) VALUES (?)")
        .bind(name)
        .execute(db.pool())
        .await?;
    Ok(())
}

async fn user_exists(db: &Database, user_id: &str) -> Result<bool, Error> {
    let mut conn = db.pool().acquire().await?;
    Ok(user::get_user(&mut conn, user_id).await?.is_some())
}

#[tokio::test]
async fn prefixed_command_executes_once_and_starts_the_cooldown_clock() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;
    let calls = Arc::new(AtomicUsize::new(0));

    let mut zap = TestCommand::new("zap");
    zap.can_disable = true;
    mirror_command(&db, "zap").await?;
    provision_channel(&db, "bob", "bob").await?;

    let registry = Arc::new(CommandRegistry::new(vec![zap.build(calls.clone())]));
    let service = CommandService::new(db.clone(), registry);
    let sender = MockMessageSender::new();

    let before = chrono::Utc::now().timestamp();
    let dispatch = service
        .handle_message(&message("bob", "100", "alice", "!zap"), &sender, &cfg)
        .await?;

    assert!(matches!(dispatch, Dispatch::Executed { command: "zap" }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // sender row was lazily created and both cooldown clocks started
    assert!(user_exists(&db, "100").await?);
    let mut conn = db.pool().acquire().await?;
    let channel_ts = command_usage::channel_last_used(&mut conn, "bob", "zap")
        .await?
        .unwrap();
    let user_ts = command_usage::user_last_used(&mut conn, "100", "zap")
        .await?
        .unwrap();
    assert!(channel_ts >= before);
    assert_eq!(channel_ts, user_ts);

    Ok(())
}

#[tokio::test]
async fn disabled_command_never_reaches_the_body() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;
    let calls = Arc::new(AtomicUsize::new(0));

    let mut zap = TestCommand::new("zap");
    zap.can_disable = true;
    mirror_command(&db, "zap").await?;
    provision_channel(&db, "bob", "bob").await?;

    let mut tx = db.pool().begin().await?;
    commands::set_command_enabled(&mut tx, false, "bob", "zap").await?;
    tx.commit().await?;

    let registry = Arc::new(CommandRegistry::new(vec![zap.build(calls.clone())]));
    let service = CommandService::new(db.clone(), registry);
    let sender = MockMessageSender::new();

    let dispatch = service
        .handle_message(&message("bob", "100", "alice", "!zap"), &sender, &cfg)
        .await?;

    assert!(matches!(
        dispatch,
        Dispatch::Blocked {
            gate: Gate::Enabled,
            ..
        }
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // the rolled-back transaction left no trace of a use
    let mut conn = db.pool().acquire().await?;
    assert_eq!(
        command_usage::channel_last_used(&mut conn, "bob", "zap").await?,
        Some(0)
    );

    Ok(())
}

#[tokio::test]
async fn missing_enablement_row_is_a_hard_error() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;
    let calls = Arc::new(AtomicUsize::new(0));

    let mut zap = TestCommand::new("zap");
    zap.can_disable = true;
    mirror_command(&db, "zap").await?;
    // channel deliberately not provisioned

    let registry = Arc::new(CommandRegistry::new(vec![zap.build(calls.clone())]));
    let service = CommandService::new(db.clone(), registry);
    let sender = MockMessageSender::new();

    let result = service
        .handle_message(&message("ghost", "100", "alice", "!zap"), &sender, &cfg)
        .await;

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn channel_cooldown_allows_exactly_one_invocation() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;
    let calls = Arc::new(AtomicUsize::new(0));

    let mut zap = TestCommand::new("zap");
    zap.channel_cooldown_seconds = 60;
    mirror_command(&db, "zap").await?;
    provision_channel(&db, "bob", "bob").await?;

    let registry = Arc::new(CommandRegistry::new(vec![zap.build(calls.clone())]));
    let service = CommandService::new(db.clone(), registry);
    let sender = MockMessageSender::new();

    let first = service
        .handle_message(&message("bob", "100", "alice", "!zap"), &sender, &cfg)
        .await?;
    assert!(matches!(first, Dispatch::Executed { .. }));

    // second use within the window, even from another user, is blocked
    let second = service
        .handle_message(&message("bob", "101", "dave", "!zap"), &sender, &cfg)
        .await?;
    assert!(matches!(
        second,
        Dispatch::Blocked {
            gate: Gate::ChannelCooldown,
            ..
        }
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn user_cooldown_is_scoped_to_the_user() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;
    let calls = Arc::new(AtomicUsize::new(0));

    let mut zap = TestCommand::new("zap");
    zap.user_cooldown_seconds = 60;
    mirror_command(&db, "zap").await?;
    provision_channel(&db, "bob", "bob").await?;

    let registry = Arc::new(CommandRegistry::new(vec![zap.build(calls.clone())]));
    let service = CommandService::new(db.clone(), registry);
    let sender = MockMessageSender::new();

    let first = service
        .handle_message(&message("bob", "100", "alice", "!zap"), &sender, &cfg)
        .await?;
    assert!(matches!(first, Dispatch::Executed { .. }));

    let repeat = service
        .handle_message(&message("bob", "100", "alice", "!zap"), &sender, &cfg)
        .await?;
    assert!(matches!(
        repeat,
        Dispatch::Blocked {
            gate: Gate::UserCooldown,
            ..
        }
    ));

    // a different user is not affected by alice's clock
    let other = service
        .handle_message(&message("bob", "101", "dave", "!zap"), &sender, &cfg)
        .await?;
    assert!(matches!(other, Dispatch::Executed { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    Ok(())
}

#[tokio::test]
async fn missing_usage_row_reads_as_not_on_cooldown() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;
    let calls = Arc::new(AtomicUsize::new(0));

    provision_channel(&db, "bob", "bob").await?;
    // alice becomes known before the command exists, so she has no usage
    // row for it
    let mut tx = db.pool().begin().await?;
    user::insert_users(&mut tx, false, &[NewUser::new("100", "alice")]).await?;
    tx.commit().await?;

    let mut zap = TestCommand::new("zap");
    zap.user_cooldown_seconds = 60;
    mirror_command(&db, "zap").await?;
    let mut tx = db.pool().begin().await?;
    commands::seed_channel_commands(&mut tx, "bob").await?;
    tx.commit().await?;

    let mut conn = db.pool().acquire().await?;
    assert_eq!(
        command_usage::user_last_used(&mut conn, "100", "zap").await?,
        None
    );
    drop(conn);

    let registry = Arc::new(CommandRegistry::new(vec![zap.build(calls.clone())]));
    let service = CommandService::new(db.clone(), registry);
    let sender = MockMessageSender::new();

    // no false-positive block from the missing row
    let dispatch = service
        .handle_message(&message("bob", "100", "alice", "!zap"), &sender, &cfg)
        .await?;
    assert!(matches!(dispatch, Dispatch::Executed { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn opted_out_user_is_blocked() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;
    let calls = Arc::new(AtomicUsize::new(0));

    let zap = TestCommand::new("zap");
    mirror_command(&db, "zap").await?;
    provision_channel(&db, "bob", "bob").await?;

    let mut tx = db.pool().begin().await?;
    user::insert_users(&mut tx, false, &[NewUser::new("100", "alice")]).await?;
    command_usage::set_opted_out(&mut tx, "100", Some("zap"), true).await?;
    tx.commit().await?;

    let registry = Arc::new(CommandRegistry::new(vec![zap.build(calls.clone())]));
    let service = CommandService::new(db.clone(), registry);
    let sender = MockMessageSender::new();

    let dispatch = service
        .handle_message(&message("bob", "100", "alice", "!zap"), &sender, &cfg)
        .await?;
    assert!(matches!(
        dispatch,
        Dispatch::Blocked {
            gate: Gate::OptedOut,
            ..
        }
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn unknown_prefixed_command_is_soft_and_touches_nothing() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;

    let registry = Arc::new(CommandRegistry::new(builtin_commands()));
    let service = CommandService::new(db.clone(), registry);
    let sender = MockMessageSender::new();

    let result = service
        .handle_message(&message("bob", "100", "alice", "!nope"), &sender, &cfg)
        .await;
    assert!(matches!(result, Err(Error::UnknownCommand(_))));

    // resolution failed before the transaction opened
    assert!(!user_exists(&db, "100").await?);

    Ok(())
}

#[tokio::test]
async fn ordinary_chat_lines_cause_no_store_access() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;
    let calls = Arc::new(AtomicUsize::new(0));

    let mut quiet = TestCommand::new("quiet");
    quiet.no_prefix = true;
    quiet.trigger = Some("trigger");
    mirror_command(&db, "quiet").await?;
    provision_channel(&db, "bob", "bob").await?;

    let registry = Arc::new(CommandRegistry::new(vec![quiet.build(calls.clone())]));
    let service = CommandService::new(db.clone(), registry);
    let sender = MockMessageSender::new();

    let dispatch = service
        .handle_message(&message("bob", "100", "alice", "hello world"), &sender, &cfg)
        .await?;
    assert!(matches!(dispatch, Dispatch::NotHandled));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // predicate evaluation only: the sender never hit the store
    assert!(!user_exists(&db, "100").await?);

    Ok(())
}

#[tokio::test]
async fn first_matching_pattern_command_wins() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;
    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));

    let mut first = TestCommand::new("first");
    first.no_prefix = true;
    first.trigger = Some("trigger");
    let mut second = TestCommand::new("second");
    second.no_prefix = true;
    second.trigger = Some("trigger");

    mirror_command(&db, "first").await?;
    mirror_command(&db, "second").await?;
    provision_channel(&db, "bob", "bob").await?;

    let registry = Arc::new(CommandRegistry::new(vec![
        first.build(first_calls.clone()),
        second.build(second_calls.clone()),
    ]));
    let service = CommandService::new(db.clone(), registry);
    let sender = MockMessageSender::new();

    let dispatch = service
        .handle_message(&message("bob", "100", "alice", "trigger now"), &sender, &cfg)
        .await?;
    assert!(matches!(dispatch, Dispatch::Executed { command: "first" }));
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn failing_body_still_consumes_the_cooldown() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;
    let calls = Arc::new(AtomicUsize::new(0));

    let mut zap = TestCommand::new("zap");
    zap.channel_cooldown_seconds = 60;
    zap.fail = true;
    mirror_command(&db, "zap").await?;
    provision_channel(&db, "bob", "bob").await?;

    let registry = Arc::new(CommandRegistry::new(vec![zap.build(calls.clone())]));
    let service = CommandService::new(db.clone(), registry);
    let sender = MockMessageSender::new();

    let first = service
        .handle_message(&message("bob", "100", "alice", "!zap"), &sender, &cfg)
        .await?;
    match first {
        Dispatch::BodyFailed { command, error } => {
            assert_eq!(command, "zap");
            assert!(matches!(error, Error::Parse(_)));
        }
        other => panic!("expected BodyFailed, got {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // the gating commit happened before the body ran, so an immediate retry
    // cannot bypass the cooldown
    let retry = service
        .handle_message(&message("bob", "100", "alice", "!zap"), &sender, &cfg)
        .await?;
    assert!(matches!(
        retry,
        Dispatch::Blocked {
            gate: Gate::ChannelCooldown,
            ..
        }
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn banned_sender_stops_at_the_ignored_gate() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;

    provision_channel(&db, "bob", "bob").await?;
    let mut tx = db.pool().begin().await?;
    user::insert_users(&mut tx, false, &[NewUser::new("300", "carol")]).await?;
    user::set_permission(&mut tx, "carol", PermissionTier::Banned).await?;
    tx.commit().await?;

    let registry = Arc::new(CommandRegistry::new(builtin_commands()));
    let service = CommandService::new(db.clone(), registry);
    // the body must never run, so the mock expects no calls at all
    let sender = MockMessageSender::new();

    let dispatch = service
        .handle_message(&message("bob", "300", "carol", "!ping"), &sender, &cfg)
        .await?;
    assert!(matches!(
        dispatch,
        Dispatch::Blocked {
            command: "ping",
            gate: Gate::Ignored,
        }
    ));

    // no last-used update either: the channel clock still reads as seeded
    let mut conn = db.pool().acquire().await?;
    assert_eq!(
        command_usage::channel_last_used(&mut conn, "bob", "ping").await?,
        Some(0)
    );

    Ok(())
}

#[tokio::test]
async fn alice_pings_bobs_channel_end_to_end() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;
    provision_channel(&db, "bob", "bob").await?;

    let registry = Arc::new(CommandRegistry::new(builtin_commands()));
    let service = CommandService::new(db.clone(), registry);

    let mut sender = MockMessageSender::new();
    sender.expect_latency().returning(|| Some(Duration::from_millis(12)));
    sender
        .expect_uptime()
        .returning(|| Duration::from_secs(3600));
    sender
        .expect_say()
        .times(1)
        .withf(|channel, text| channel == "bob" && text.starts_with("Pong!"))
        .returning(|_, _| ());

    let before = chrono::Utc::now().timestamp();
    let dispatch = service
        .handle_message(&message("bob", "100", "alice", "!ping"), &sender, &cfg)
        .await?;
    assert!(matches!(dispatch, Dispatch::Executed { command: "ping" }));

    let mut conn = db.pool().acquire().await?;
    let ts = command_usage::channel_last_used(&mut conn, "bob", "ping")
        .await?
        .unwrap();
    assert!(ts >= before);

    Ok(())
}

#[tokio::test]
async fn setlevel_accepts_named_and_positional_arguments() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;
    provision_channel(&db, "bob", "bob").await?;

    let mut tx = db.pool().begin().await?;
    user::insert_users(
        &mut tx,
        false,
        &[NewUser::new("100", "alice"), NewUser::new("300", "carol")],
    )
    .await?;
    user::set_permission(&mut tx, "alice", PermissionTier::Admin).await?;
    tx.commit().await?;

    let registry = Arc::new(CommandRegistry::new(builtin_commands()));
    let service = CommandService::new(db.clone(), registry);

    let mut sender = MockMessageSender::new();
    sender.expect_say().returning(|_, _| ());

    let named = service
        .handle_message(
            &message("bob", "100", "alice", "!setlevel user:carol level:banned"),
            &sender,
            &cfg,
        )
        .await?;
    assert!(matches!(named, Dispatch::Executed { command: "setlevel" }));

    let mut conn = db.pool().acquire().await?;
    assert_eq!(user::is_ignored(&mut conn, "300").await?, Some(true));
    drop(conn);

    // rewind the cooldown clocks so the second convention is not blocked
    sqlx::query("UPDATE channel_commands SET last_used = 0 WHERE channel_id = 'bob'")
        .execute(db.pool())
        .await?;
    sqlx::query("UPDATE user_command_data SET last_used = 0 WHERE user_id = '100'")
        .execute(db.pool())
        .await?;

    let positional = service
        .handle_message(
            &message("bob", "100", "alice", "!setlevel carol user"),
            &sender,
            &cfg,
        )
        .await?;
    assert!(matches!(
        positional,
        Dispatch::Executed { command: "setlevel" }
    ));

    let mut conn = db.pool().acquire().await?;
    assert_eq!(user::is_ignored(&mut conn, "300").await?, Some(false));

    Ok(())
}

#[tokio::test]
async fn join_body_provisions_the_channel() -> Result<(), Error> {
    let (db, cfg) = setup_test_database().await?;
    provision_channel(&db, "bob", "bob").await?;

    let registry = Arc::new(CommandRegistry::new(builtin_commands()));
    let service = CommandService::new(db.clone(), registry);

    let mut sender = MockMessageSender::new();
    sender
        .expect_join()
        .times(1)
        .withf(|channels| channels.len() == 1 && channels[0] == "alice")
        .returning(|_| ());
    sender.expect_say().returning(|_, _| ());

    let dispatch = service
        .handle_message(&message("bob", "100", "alice", "!join"), &sender, &cfg)
        .await?;
    assert!(matches!(dispatch, Dispatch::Executed { command: "join" }));

    // channel fully provisioned: joined flag plus a row per command in both
    // per-channel and per-user state
    let mut conn = db.pool().acquire().await?;
    let alice = user::get_user(&mut conn, "100").await?.unwrap();
    assert!(alice.bot_is_joined);
    drop(conn);

    let commands_row = sqlx::query("SELECT COUNT(*) AS n FROM commands")
        .fetch_one(db.pool())
        .await?;
    let seeded_row =
        sqlx::query("SELECT COUNT(*) AS n FROM channel_commands WHERE channel_id = '100'")
            .fetch_one(db.pool())
            .await?;
    assert_eq!(
        seeded_row.try_get::<i64, _>("n")?,
        commands_row.try_get::<i64, _>("n")?
    );

    Ok(())
}
