use std::path::Path;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cricket_scorer::api::CommentaryGenerator;
use cricket_scorer::config::Config;
use cricket_scorer::db::StateStore;
use cricket_scorer::models::{DismissedEnd, Match, Team, WicketKind};
use cricket_scorer::photo;
use cricket_scorer::scoring::{DeliveryOutcome, MatchSetup, Scorecard, WicketDetails};
use cricket_scorer::session::{PersistWarning, ScoringSession};
use cricket_scorer::workers::commentary::commentary_channel;

const COMMENTARY_QUEUE: usize = 16;

/// Most runs the console accepts off the bat for one delivery
const MAX_RUNS_OFF_BAT: u32 = 6;

const HELP: &str = "\
Commands:
  teams                                  list teams and players
  team <name>                            create a team
  rename <team#> <name>                  rename a team
  player <team#> <name> [--photo=path]  add a player
  start <bat#> <bowl#> <overs> <striker#> <non-striker#> <bowler#>
  ball <0-6 | wd[N] | nb[N]>             score a delivery
  wicket <s|n> <kind> <new batter#> [fielder]
  bowler <#>                             change bowler
  score                                  show the scoreboard
  end                                    end the match and show the scorecard
  history                                list completed matches
  quit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cricket_scorer=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cricket-scorer");

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");

    // Initialize storage
    let store = StateStore::open(&config.database_url, config.storage_quota_bytes).await?;
    info!("Storage initialized");

    // Commentary worker
    let generator = CommentaryGenerator::from_config(&config);
    let (dispatcher, worker) = commentary_channel(generator, COMMENTARY_QUEUE);
    let commentary_handle = tokio::spawn(async move {
        worker.run().await;
    });

    let mut session = ScoringSession::load(store, Some(dispatcher)).await?;

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match run_command(&mut session, line.trim()).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("! {}", e),
                }
            }
        }
    }

    drop(session);
    if let Err(e) = commentary_handle.await {
        error!("Commentary worker exited abnormally: {:?}", e);
    }

    info!("Shutting down cricket-scorer");
    Ok(())
}

/// Run one console command; returns false on quit
async fn run_command(session: &mut ScoringSession, line: &str) -> Result<bool> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let args: Vec<&str> = rest.split_whitespace().collect();

    match command {
        "" => {}
        "help" => println!("{}", HELP),
        "quit" | "exit" => return Ok(false),
        "teams" => print_teams(session.teams()),
        "team" => {
            let saved = session.create_team(rest).await;
            report(&saved.warnings);
        }
        "rename" => {
            let team = team_at(session.teams(), arg(&args, 0)?)?.id;
            let name = args.get(1..).map(|a| a.join(" ")).unwrap_or_default();
            report(&session.rename_team(team, &name).await?.warnings);
        }
        "player" => {
            let team = team_at(session.teams(), arg(&args, 0)?)?.id;
            let (name, photo_path) = split_photo_arg(args.get(1..).unwrap_or_default());
            if name.is_empty() {
                anyhow::bail!("Missing player name. Type help.");
            }
            let photo = match photo_path {
                Some(path) => Some(photo::load_data_uri(Path::new(path))?),
                None => None,
            };
            report(&session.add_player(team, &name, photo).await?.warnings);
        }
        "start" => {
            let setup = parse_setup(session.teams(), &args)?;
            report(&session.start_match(&setup).await?.warnings);
            print_scoreboard(session);
        }
        "ball" => {
            let outcome = parse_outcome(arg(&args, 0)?)
                .ok_or_else(|| anyhow::anyhow!("Unrecognised delivery: {}", rest))?;
            report(&session.score_delivery(&outcome, None).await?.warnings);
            print_scoreboard(session);
        }
        "wicket" => {
            let details = parse_wicket(session, &args)?;
            let saved = session
                .score_delivery(&DeliveryOutcome::wicket(), Some(&details))
                .await?;
            report(&saved.warnings);
            print_scoreboard(session);
        }
        "bowler" => {
            let team = session
                .active_match()
                .and_then(|m| session.team(m.bowling_team_id))
                .ok_or_else(|| anyhow::anyhow!("No match is in progress"))?;
            let bowler = player_at(team, arg(&args, 0)?)?;
            report(&session.change_bowler(bowler).await?.warnings);
            print_scoreboard(session);
        }
        "score" => print_scoreboard(session),
        "end" => {
            let saved = session.end_match().await?;
            report(&saved.warnings);
            print_scorecard(session, &saved.value.completed, &saved.value.scorecard);
        }
        "history" => {
            for (i, m) in session.history().iter().enumerate() {
                println!(
                    "{}. {} {} vs {}: {} ({} ov)",
                    i + 1,
                    m.date.format("%Y-%m-%d"),
                    team_name(session, m.team_a_id),
                    team_name(session, m.team_b_id),
                    m.score_label(),
                    m.overs_label()
                );
            }
        }
        other => println!("Unknown command '{}'. Type help.", other),
    }

    Ok(true)
}

/// Delivery token: runs off the bat, or a wide/no-ball with optional runs
fn parse_outcome(token: &str) -> Option<DeliveryOutcome> {
    let token = token.to_lowercase();
    let runs = |digits: &str| -> Option<u32> {
        if digits.is_empty() {
            return Some(0);
        }
        digits.parse().ok().filter(|n| *n <= MAX_RUNS_OFF_BAT)
    };

    if let Some(rest) = token.strip_prefix("wd") {
        return runs(rest).map(DeliveryOutcome::wide);
    }
    if let Some(rest) = token.strip_prefix("nb") {
        return runs(rest).map(DeliveryOutcome::no_ball);
    }
    match token.parse::<u32>() {
        Ok(n) if n <= MAX_RUNS_OFF_BAT => Some(DeliveryOutcome::runs(n)),
        _ => None,
    }
}

fn parse_setup(teams: &[Team], args: &[&str]) -> Result<MatchSetup> {
    let batting = team_at(teams, arg(args, 0)?)?;
    let bowling = team_at(teams, arg(args, 1)?)?;

    Ok(MatchSetup {
        team_a_id: Some(batting.id),
        team_b_id: Some(bowling.id),
        total_overs: arg(args, 2)?.parse()?,
        batting_team_id: Some(batting.id),
        striker_id: Some(player_at(batting, arg(args, 3)?)?),
        non_striker_id: Some(player_at(batting, arg(args, 4)?)?),
        bowler_id: Some(player_at(bowling, arg(args, 5)?)?),
    })
}

fn parse_wicket(session: &ScoringSession, args: &[&str]) -> Result<WicketDetails> {
    let dismissed_end = parse_end(arg(args, 0)?)?;
    let wicket_kind: WicketKind = arg(args, 1)?.parse().map_err(anyhow::Error::msg)?;
    let batting = session
        .active_match()
        .and_then(|m| session.team(m.batting_team_id))
        .ok_or_else(|| anyhow::anyhow!("No match is in progress"))?;
    let replacement = player_at(batting, arg(args, 2)?)?;
    let fielder = args
        .get(3..)
        .map(|a| a.join(" "))
        .filter(|f| !f.is_empty() && wicket_kind.involves_fielder());

    if !session.available_batters().iter().any(|p| p.id == replacement) {
        anyhow::bail!("That player has already batted");
    }

    Ok(WicketDetails {
        dismissed_end,
        wicket_kind,
        replacement_id: Some(replacement),
        fielder,
    })
}

/// Dismissed end token: `s` for the striker, `n` for the non-striker
fn parse_end(token: &str) -> Result<DismissedEnd> {
    match token.to_lowercase().as_str() {
        "s" => Ok(DismissedEnd::Striker),
        "n" => Ok(DismissedEnd::NonStriker),
        other => anyhow::bail!("Dismissed end must be s or n, got '{}'", other),
    }
}

/// Player name words plus an optional `--photo=<path>` argument
fn split_photo_arg<'a>(args: &[&'a str]) -> (String, Option<&'a str>) {
    let mut photo = None;
    let mut words = Vec::new();
    for a in args {
        match a.strip_prefix("--photo=") {
            Some(path) => photo = Some(path),
            None => words.push(*a),
        }
    }
    (words.join(" "), photo)
}

fn arg<'a>(args: &[&'a str], index: usize) -> Result<&'a str> {
    args.get(index)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Missing argument {}. Type help.", index + 1))
}

fn team_at<'a>(teams: &'a [Team], token: &str) -> Result<&'a Team> {
    token
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| teams.get(i))
        .ok_or_else(|| anyhow::anyhow!("No team #{}", token))
}

fn player_at(team: &Team, token: &str) -> Result<uuid::Uuid> {
    token
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| team.players.get(i))
        .map(|p| p.id)
        .ok_or_else(|| anyhow::anyhow!("No player #{} in {}", token, team.name))
}

fn team_name(session: &ScoringSession, id: uuid::Uuid) -> String {
    session
        .team(id)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn report(warnings: &[PersistWarning]) {
    for w in warnings {
        warn!("{} not saved", w.record);
        println!("! {}", w.message);
    }
}

fn print_teams(teams: &[Team]) {
    for (i, team) in teams.iter().enumerate() {
        println!("{}. {}", i + 1, team.name);
        for (j, p) in team.players.iter().enumerate() {
            println!(
                "   {}. {:<20} M {:>3}  R {:>4}  Avg {:>6.2}  W {:>3}  Econ {:>5.2}",
                j + 1,
                p.name,
                p.stats.matches,
                p.stats.runs,
                p.stats.batting_average(),
                p.stats.wickets,
                p.stats.economy()
            );
        }
    }
}

fn print_scoreboard(session: &ScoringSession) {
    let Some(m) = session.active_match() else {
        println!("No match in progress.");
        return;
    };
    let name = |id: Option<uuid::Uuid>| {
        id.and_then(|id| session.player_name(id))
            .unwrap_or("-")
            .to_string()
    };

    let this_over: Vec<String> = m.this_over().iter().map(|b| b.label()).collect();
    println!(
        "{} {} ({} / {} ov)  CRR {:.2}",
        team_name(session, m.batting_team_id),
        m.score_label(),
        m.overs_label(),
        m.total_overs,
        m.current_run_rate()
    );
    println!(
        "  * {}  |  {}  |  bowling: {}  |  this over: {}",
        name(m.striker_id),
        name(m.non_striker_id),
        name(m.bowler_id),
        this_over.join(" ")
    );

    let squad = session
        .team(m.batting_team_id)
        .map(|t| t.players.len())
        .unwrap_or_default();
    if m.innings_complete(squad) {
        println!("  Innings complete, type end to finish the match.");
    }
}

fn print_scorecard(session: &ScoringSession, m: &Match, card: &Scorecard) {
    let name = |id| session.player_name(id).unwrap_or("Unknown").to_string();

    println!(
        "{} {} ({} ov), extras {}",
        team_name(session, m.batting_team_id),
        m.score_label(),
        m.overs_label(),
        card.totals.extras
    );
    println!("{:<20} {:>4} {:>4} {:>3} {:>3} {:>7}", "Batter", "R", "B", "4s", "6s", "SR");
    for line in &card.batting {
        let status = match line.dismissal {
            Some(kind) => kind.as_str().to_string(),
            None if line.is_out => "out".to_string(),
            None => "not out".to_string(),
        };
        println!(
            "{:<20} {:>4} {:>4} {:>3} {:>3} {:>7.2}  {}",
            name(line.player_id),
            line.runs,
            line.balls,
            line.fours,
            line.sixes,
            line.strike_rate(),
            status
        );
    }
    println!("{:<20} {:>5} {:>4} {:>3} {:>6}", "Bowler", "O", "R", "W", "Econ");
    for line in &card.bowling {
        println!(
            "{:<20} {:>5} {:>4} {:>3} {:>6.2}",
            name(line.player_id),
            line.overs_label(),
            line.runs,
            line.wickets,
            line.economy()
        );
    }
    let chart: Vec<String> = card
        .runs_per_over
        .iter()
        .map(|p| format!("{}:{}", p.over, p.runs))
        .collect();
    println!("Runs by over: {}", chart.join("  "));
}
