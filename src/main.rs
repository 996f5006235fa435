//! SWIPEBET — swipe-to-wager client core for on-chain prediction markets
//!
//! Entry point. Loads configuration, initialises structured logging,
//! seeds an in-process ledger and drives a bet session from stdin, one
//! command per line, until `quit`, end of input or Ctrl+C.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use swipebet::config;
use swipebet::engine::creator::NewPrediction;
use swipebet::engine::session::{BetSession, SessionSettings, SwipeOutcome};
use swipebet::ledger::memory::InMemoryLedger;
use swipebet::types::Gesture;

const BANNER: &str = r#"
 ___ _    _ ___ ___ ___ ___ ___ _____
/ __| |  | |_ _| _ \ __| _ ) __|_   _|
\__ \ |/\| || ||  _/ _|| _ \ _|  | |
|___/__/\__/|___|_| |___|___/___| |_|

  swipe right: yes  |  swipe left: no  |  swipe up: pass
"#;

const HELP: &str = "\
commands:
  yes | right            bet YES on the top card
  no | left              bet NO on the top card
  pass | up              skip the top card
  + | -                  raise / lower the stake
  stake <n>              set the stake
  deposit <n>            move funds into escrow
  withdraw <n>           move funds out of escrow
  refresh                re-read markets and balance
  bets                   wagers placed by this account
  created                markets created by this account
  create <bet_h> <res_h> <question>
  dismiss                clear notices and the deposit prompt
  help | quit";

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Swipe(Gesture),
    Increment,
    Decrement,
    Stake(String),
    Deposit(Decimal),
    Withdraw(Decimal),
    Refresh,
    Bets,
    Created,
    Create(NewPrediction),
    Dismiss,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let amount = || -> Result<Decimal> {
            rest.parse::<Decimal>()
                .with_context(|| format!("not an amount: {rest:?}"))
        };

        Ok(match head.to_lowercase().as_str() {
            "+" => Command::Increment,
            "-" => Command::Decrement,
            "stake" => Command::Stake(rest.to_string()),
            "deposit" => Command::Deposit(amount()?),
            "withdraw" => Command::Withdraw(amount()?),
            "refresh" | "r" => Command::Refresh,
            "bets" => Command::Bets,
            "created" => Command::Created,
            "create" => Command::Create(parse_create(rest)?),
            "dismiss" => Command::Dismiss,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => Command::Swipe(other.parse()?),
        })
    }
}

fn parse_create(args: &str) -> Result<NewPrediction> {
    let mut parts = args.splitn(3, ' ');
    let (Some(betting), Some(resolution), Some(question)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("usage: create <betting_hours> <resolution_hours> <question>");
    };
    Ok(NewPrediction {
        question: question.trim().to_string(),
        betting_hours: betting.parse().context("betting hours")?,
        resolution_hours: resolution.parse().context("resolution hours")?,
        ..NewPrediction::default()
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("SWIPEBET_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = if std::path::Path::new(&config_path).exists() {
        config::AppConfig::load(&config_path)?
    } else {
        config::AppConfig::default()
    };

    init_logging();
    println!("{BANNER}");

    let settings = SessionSettings::from_config(&cfg)?;
    let ledger = InMemoryLedger::from_config(&cfg.ledger, &settings.currency, &settings.identity)?;
    info!(
        config = %config_path,
        identity = %settings.identity,
        currency = %settings.currency,
        "SWIPEBET starting up"
    );

    let mut session = BetSession::new(Arc::new(ledger), settings);
    session.load().await;

    let json_view = std::env::var("SWIPEBET_VIEW_JSON").is_ok();
    print_view(&session, json_view);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        run_command(&mut session, command).await;
                        print_view(&session, json_view);
                    }
                    Err(e) => println!("{e}\n{HELP}"),
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!(
        cursor = session.cursor(),
        markets = session.markets().len(),
        "SWIPEBET shut down cleanly."
    );
    Ok(())
}

async fn run_command(session: &mut BetSession, command: Command) {
    match command {
        Command::Swipe(gesture) => match session.swipe(gesture).await {
            SwipeOutcome::Ignored => println!("(ignored)"),
            SwipeOutcome::Passed | SwipeOutcome::Settled(_) => {}
            SwipeOutcome::Dispatched(handle) => println!("waiting for {handle}"),
        },
        Command::Increment => {
            session.increment_stake();
        }
        Command::Decrement => {
            session.decrement_stake();
        }
        Command::Stake(text) => {
            if !session.set_stake_text(&text) {
                println!("invalid stake {text:?}, keeping {}", session.stake());
            }
        }
        Command::Deposit(amount) => {
            if let Ok(handle) = session.deposit(amount).await {
                println!("deposited {amount} ({handle})");
            }
        }
        Command::Withdraw(amount) => {
            if let Ok(handle) = session.withdraw(amount).await {
                println!("withdrew {amount} ({handle})");
            }
        }
        Command::Refresh => {
            let _ = session.refresh_markets().await;
            let _ = session.refresh_balance().await;
        }
        Command::Bets | Command::Created => match session.portfolio().await {
            Ok(p) if command == Command::Bets => {
                if p.placed.is_empty() {
                    println!("no bets placed");
                }
                for bet in &p.placed {
                    println!(
                        "{} {}  {} on {}  win chance {:.2}%",
                        bet.market_id, bet.question, bet.amount_display, bet.choice, bet.win_chance_pct
                    );
                }
            }
            Ok(p) => {
                if p.created.is_empty() {
                    println!("no predictions created");
                }
                for m in &p.created {
                    println!("{} {}  pool {}  {}", m.market_id, m.question, m.pool, m.odds);
                }
            }
            Err(e) => warn!(error = %e, "Portfolio unavailable"),
        },
        Command::Create(prediction) => {
            if let Ok(handle) = session.create_prediction(&prediction).await {
                println!("created \"{}\" ({handle})", prediction.question);
            }
        }
        Command::Dismiss => {
            session.dismiss_notice();
            session.dismiss_deposit_prompt();
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

fn print_view(session: &BetSession, json: bool) {
    let view = session.view();
    if json {
        match serde_json::to_string(&view) {
            Ok(s) => println!("{s}"),
            Err(e) => warn!(error = %e, "Failed to serialize view"),
        }
    } else {
        println!("{view}");
    }
}

/// Initialise tracing with env-filter and optional JSON output.
///
/// Logs go to stderr so they never interleave with the rendered view.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("swipebet=info"));

    let json_logging = std::env::var("SWIPEBET_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
