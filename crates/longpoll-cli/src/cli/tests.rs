use super::*;

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

fn poll_args(args: &[&str]) -> PollArgs {
    match parse(args) {
        CliCommand::Poll(a) => a,
        other => panic!("expected Poll, got {:?}", other),
    }
}

#[test]
fn cli_parse_poll_defaults() {
    let a = poll_args(&["longpoll", "poll"]);
    assert!(a.url.is_none());
    assert!(a.headers.is_empty());
    assert!(!a.json);
}

#[test]
fn cli_parse_poll_overrides() {
    let a = poll_args(&[
        "longpoll",
        "poll",
        "--url",
        "http://localhost:9000/status",
        "--interval-ms",
        "100",
        "--max-polls",
        "5",
        "--max-retries",
        "2",
        "--exp-backoff",
        "1.5",
        "--timeout-ms",
        "500",
        "-H",
        "Authorization: Bearer t",
        "--json",
    ]);
    assert_eq!(a.url.as_deref(), Some("http://localhost:9000/status"));
    assert_eq!(a.interval_ms, Some(100));
    assert_eq!(a.max_polls, Some(5));
    assert_eq!(a.max_retries, Some(2));
    assert_eq!(a.exp_backoff, Some(1.5));
    assert_eq!(a.timeout_ms, Some(500));
    assert_eq!(a.headers, vec!["Authorization: Bearer t".to_string()]);
    assert!(a.json);
}

#[test]
fn poll_args_apply_on_top_of_config() {
    let a = poll_args(&[
        "longpoll",
        "poll",
        "--max-polls",
        "3",
        "--method",
        "post",
        "-H",
        "X-Token:  abc ",
    ]);
    let mut cfg = PollConfig::default();
    a.apply(&mut cfg).unwrap();
    assert_eq!(cfg.max_polls, 3);
    assert_eq!(cfg.request.method, "post");
    assert_eq!(cfg.request.headers.get("X-Token").map(String::as_str), Some("abc"));
    // Untouched values keep the file defaults.
    assert_eq!(cfg.poll_interval_ms, PollConfig::default().poll_interval_ms);
    assert!(cfg.windows.is_none());
}

#[test]
fn poll_args_windows() {
    let a = poll_args(&[
        "longpoll",
        "poll",
        "--window-start",
        "1000",
        "--window-start",
        "5000",
        "--polls-per-window",
        "3",
    ]);
    let mut cfg = PollConfig::default();
    a.apply(&mut cfg).unwrap();
    let w = cfg.windows.unwrap();
    assert_eq!(w.window_starts_ms, vec![1000, 5000]);
    assert_eq!(w.polls_per_window, 3);
}

#[test]
fn poll_args_window_start_needs_polls_per_window() {
    let a = poll_args(&["longpoll", "poll", "--window-start", "1000"]);
    let mut cfg = PollConfig::default();
    assert!(a.apply(&mut cfg).is_err());
}

#[test]
fn polls_per_window_requires_window_start() {
    assert!(Cli::try_parse_from(["longpoll", "poll", "--polls-per-window", "3"]).is_err());
}

#[test]
fn poll_args_rejects_malformed_header() {
    let a = poll_args(&["longpoll", "poll", "-H", "no-colon"]);
    let mut cfg = PollConfig::default();
    assert!(a.apply(&mut cfg).is_err());
}

#[test]
fn cli_parse_config() {
    match parse(&["longpoll", "config"]) {
        CliCommand::Config => {}
        other => panic!("expected Config, got {:?}", other),
    }
}

#[test]
fn cli_parse_sim_reset() {
    match parse(&[
        "longpoll",
        "sim-reset",
        "--sim-time",
        "5",
        "--server-wait",
        "3000",
    ]) {
        CliCommand::SimReset {
            sim_time,
            err_rate,
            server_wait,
            base,
        } => {
            assert_eq!(sim_time, 5);
            assert!(err_rate.is_none());
            assert_eq!(server_wait, Some(3000));
            assert_eq!(base, "http://127.0.0.1:8080");
        }
        other => panic!("expected SimReset, got {:?}", other),
    }
}

#[test]
fn cli_parse_global_log_file() {
    let cli = Cli::try_parse_from(["longpoll", "config", "--log-file", "/tmp/lp.log"]).unwrap();
    assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/lp.log")));
    assert!(matches!(cli.command, CliCommand::Config));

    let cli = Cli::try_parse_from(["longpoll", "poll"]).unwrap();
    assert!(cli.log_file.is_none());
}

#[tokio::test]
async fn sim_reset_does_not_read_user_config() {
    // Nothing listens on port 9, so the reset itself fails; the config loader must not run.
    let cmd = parse(&[
        "longpoll",
        "sim-reset",
        "--sim-time",
        "1",
        "--base",
        "http://127.0.0.1:9",
    ]);
    let err = cmd
        .dispatch(|| Err(anyhow::anyhow!("broken config.toml")))
        .await
        .unwrap_err();
    assert!(!format!("{:#}", err).contains("broken config.toml"), "{:#}", err);
}

#[tokio::test]
async fn config_command_surfaces_loader_error() {
    let err = CliCommand::Config
        .dispatch(|| Err(anyhow::anyhow!("broken config.toml")))
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("broken config.toml"));
}
