use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use glimpse_contracts::chat::{parse_intent, CHAT_HELP_COMMANDS};
use glimpse_contracts::game::{Difficulty, Role, SessionState};
use glimpse_engine::{GameEngine, GameSetup};

#[derive(Parser)]
#[command(name = "glimpse-rs", version, about = "Describe-the-image guessing game")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate an image and play the guessing game in the terminal.
    Play(PlayArgs),
}

#[derive(Args)]
struct PlayArgs {
    /// What the image should depict.
    #[arg(long)]
    topic: String,

    /// easy, medium, or hard.
    #[arg(long, default_value = "medium")]
    difficulty: String,

    /// Rendering style passed to the image prompt.
    #[arg(long, default_value = "")]
    style: String,

    /// Player age, used to tone the prompt.
    #[arg(long)]
    age: Option<u32>,

    /// Wrong guesses allowed (1-50).
    #[arg(long, default_value_t = 10)]
    attempts: u32,

    /// Features needed for a win (1-20).
    #[arg(long, default_value_t = 3)]
    threshold: u32,

    /// Session directory for the image, snapshot, and event log.
    #[arg(long, default_value = "glimpse_out")]
    out: PathBuf,

    #[arg(long)]
    image_model: Option<String>,

    #[arg(long)]
    hint_model: Option<String>,

    /// Continue the persisted session instead of generating a new image.
    #[arg(long)]
    resume: bool,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("glimpse-rs error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Play(args) => run_play(args),
    }
}

fn run_play(args: PlayArgs) -> Result<i32> {
    let Some(difficulty) = Difficulty::parse(&args.difficulty) else {
        eprintln!("Setup error: difficulty must be easy, medium, or hard");
        return Ok(2);
    };
    let mut engine = GameEngine::new(&args.out, args.image_model.clone(), args.hint_model.clone())?;
    let setup = GameSetup {
        topic: args.topic.clone(),
        style: args.style.clone(),
        age: args.age,
        difficulty,
        attempts: args.attempts,
        threshold: args.threshold,
    };

    let mut state = match resume_or_start(&mut engine, &setup, args.resume) {
        Ok(state) => state,
        Err(err) => {
            eprintln!("Setup error: {err:#}");
            return Ok(2);
        }
    };

    print_board(&state);
    println!("Type your guesses, or /help for commands.");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        if state.finished {
            print_summary(&state);
            break;
        }

        print!("> ");
        io::stdout().flush()?;
        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        let intent = parse_intent(input);
        match intent.action.as_str() {
            "noop" => continue,
            "help" => {
                println!("Commands: {}", CHAT_HELP_COMMANDS.join(" "));
            }
            "status" => {
                print_board(&state);
            }
            "hint" => {
                state = play_turn(&mut engine, &state, "hint")?;
            }
            "reset" => {
                engine.reset()?;
                println!("Session cleared. Run `glimpse-rs play` again for a new game.");
                return Ok(0);
            }
            "new_game" => {
                let topic = intent
                    .command_args
                    .get("topic")
                    .and_then(|value| value.as_str())
                    .unwrap_or("")
                    .trim()
                    .to_string();
                let mut next_setup = setup.clone();
                if !topic.is_empty() {
                    next_setup.topic = topic;
                }
                engine.reset()?;
                match engine.new_game(&next_setup) {
                    Ok(next) => {
                        state = next;
                        print_board(&state);
                    }
                    Err(err) => println!("Couldn't start a new game: {err:#}"),
                }
            }
            "quit" => break,
            "unknown" => {
                let command = intent
                    .command_args
                    .get("command")
                    .and_then(|value| value.as_str())
                    .unwrap_or("?");
                println!("Unknown command /{command}. Try /help.");
            }
            _ => {
                if let Some(guess) = intent.guess.as_deref() {
                    state = play_turn(&mut engine, &state, guess)?;
                }
            }
        }
    }
    Ok(0)
}

fn resume_or_start(
    engine: &mut GameEngine,
    setup: &GameSetup,
    resume: bool,
) -> Result<SessionState> {
    if resume {
        if let Some(state) = engine.resume() {
            println!("Resuming your game in progress.");
            return Ok(state);
        }
        println!("No resumable session found; starting fresh.");
    }
    engine.new_game(setup)
}

fn play_turn(engine: &mut GameEngine, state: &SessionState, guess: &str) -> Result<SessionState> {
    let before = state.chat_history.len();
    let (next, report) = engine.submit_guess(state, guess)?;
    if !report.accepted {
        return Ok(next);
    }
    for message in next.chat_history.iter().skip(before) {
        if message.role == Role::Assistant {
            println!("{}", message.text);
        }
    }
    if report.consumed_attempt {
        println!("Attempts left: {}", next.attempts_remaining);
    }
    Ok(next)
}

fn print_board(state: &SessionState) {
    let Some(image) = state.image.as_ref() else {
        println!("No game in progress.");
        return;
    };
    println!("Image: {}", image.url);
    println!(
        "Found {} of {} features | attempts left: {} | win threshold: {}",
        state.found_features.len(),
        state.total_features(),
        state.attempts_remaining,
        state.config.win_threshold
    );
    let found = state.found_for_display();
    if !found.is_empty() {
        println!("Found so far: {}", found.join(", "));
    }
}

fn print_summary(state: &SessionState) {
    if state.all_found {
        println!("You found every feature. Perfect game!");
    } else if state.threshold_met {
        println!("Out of attempts, but you met the win threshold. Nice work!");
    } else {
        println!("Out of attempts. Better luck next time!");
    }
    let missed = state.remaining_features();
    if !missed.is_empty() {
        println!("You missed: {}", missed.join(", "));
    }
}
