use language_trainer::authoring::{parse_set_header, SetBuilder, END_MARKER};
use language_trainer::config::Config;
use language_trainer::error::ValidationError;
use language_trainer::report::set_table;
use language_trainer::store::FileStore;
use language_trainer::training::{train, SessionConfig, TrainingSession};
use language_trainer::traits::{Console, Direction, SetStore};

use clap::{Parser, Subcommand};
use std::error::Error;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Drill yourself on sets of word pairs.
#[derive(Parser, Debug)]
#[clap(long_about = None)]
struct Args {
    /// Config file.
    #[clap(short, long, default_value = "trainer.yaml")]
    config: PathBuf,

    /// Directory holding the sets, overrides the config.
    #[clap(long)]
    sets_dir: Option<PathBuf>,

    /// Seed for shuffling, overrides the config.
    #[clap(long)]
    seed: Option<u64>,

    /// Do not clear the terminal.
    #[clap(long)]
    no_clear: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a set, by name or by its number in the list.
    Train { set: String },
    /// Create a new set.
    Create,
    /// Print a set as a dictionary.
    Print { set: String },
    /// Permanently remove a set.
    Remove { set: String },
    /// List all sets.
    List,
}

/// Console on stdin and stdout.
struct StdConsole {
    stdin: std::io::Stdin,
}

impl StdConsole {
    fn new() -> Self {
        StdConsole {
            stdin: std::io::stdin(),
        }
    }

    fn clear(&mut self) -> Result<(), Box<dyn Error>> {
        use crossterm::{cursor, execute, terminal};
        execute!(
            std::io::stdout(),
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        Ok(())
    }

    /// Ask until one of the options is typed.
    fn choose(&mut self, prompt: &str, options: &[&str]) -> Option<String> {
        loop {
            self.write(prompt);
            let line = self.read_line()?.trim().to_lowercase();
            if options.contains(&line.as_str()) {
                return Some(line);
            }
            self.write_line(&format!("Type one of {}, try again", options.join(", ")));
        }
    }
}

impl Console for StdConsole {
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_owned()),
        }
    }

    fn write_line(&mut self, line: &str) {
        println!("{line}");
    }

    fn write(&mut self, text: &str) {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.choose(&format!("{prompt} y for yes, n for no: "), &["y", "n"])
            .map(|answer| answer == "y")
            .unwrap_or(false)
    }
}

/// A set given by name, or by its 1 based position in the list.
fn resolve_key(store: &FileStore, given: &str) -> Result<String, Box<dyn Error>> {
    let keys = store.list_keys()?;
    if let Ok(number) = given.parse::<usize>() {
        return keys
            .get(number.wrapping_sub(1))
            .cloned()
            .ok_or_else(|| format!("there is no set number {number}").into());
    }
    if store.exists(given) {
        return Ok(given.to_owned());
    }
    Err(format!("set '{given}' could not be found").into())
}

fn create(console: &mut StdConsole, store: &mut FileStore) -> Result<(), Box<dyn Error>> {
    let header = loop {
        console.write_line("Give a name for the set, followed by the two languages separated by comma");
        console.write_line("For example: Text1Grammar, english, swedish");
        let line = match console.read_line() {
            Some(line) => line,
            None => return Ok(()),
        };
        match parse_set_header(&line) {
            Ok(header) if store.exists(&header.name) => {
                console.write_line(&ValidationError::SetNameTaken(header.name).to_string());
            }
            Ok(header) => break header,
            Err(e) => console.write_line(&format!("{e}, try again")),
        }
    };

    let mut builder = SetBuilder::new(&header.language_a, &header.language_b);
    console.write_line("Give as many word pairs as you want, separate multiple translations with a comma");
    console.write_line(&format!(
        "Type {END_MARKER} when asked for a {} word to finish",
        builder.language_a()
    ));
    loop {
        console.write(&format!("Give {} word: ", builder.language_a()));
        let forward = match console.read_line() {
            Some(line) if line.trim() == END_MARKER => break,
            Some(line) => line,
            None => break,
        };
        console.write(&format!("Give {} word: ", builder.language_b()));
        let backward = console.read_line().unwrap_or_default();
        if let Err(e) = builder.push_raw(&forward, &backward) {
            console.write_line(&format!("{e}, the pair was not added"));
        }
    }

    if builder.is_empty() {
        console.write_line("The set wasn't saved because there were no word pairs yet");
        return Ok(());
    }
    let count = builder.len();
    store.save(&header.name, &builder.build())?;
    console.write_line(&format!("Saved {count} pairs as {}", header.name));
    Ok(())
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load(&args.config)?;
    if let Some(dir) = args.sets_dir {
        config.sets_dir = dir;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.no_clear {
        config.clear_screen = false;
    }

    let mut console = StdConsole::new();
    let mut store = FileStore::new(&config.sets_dir, config.format);
    if config.clear_screen {
        console.clear()?;
    }

    match args.command {
        Command::List => {
            for (i, key) in store.list_keys()?.iter().enumerate() {
                console.write_line(&format!("{}. {key}", i + 1));
            }
        }
        Command::Print { set } => {
            let key = resolve_key(&store, &set)?;
            for line in set_table(&store.load(&key)?) {
                console.write_line(&line);
            }
        }
        Command::Remove { set } => {
            let key = resolve_key(&store, &set)?;
            let prompt = format!("Do you really want to permanently destroy the set {key}?");
            if console.confirm(&prompt) {
                store.remove(&key)?;
            }
        }
        Command::Create => create(&mut console, &mut store)?,
        Command::Train { set } => {
            let key = resolve_key(&store, &set)?;
            let loaded = store.load(&key)?;
            let prompt = format!(
                "Type 1 to answer in {}, 2 to answer in {}: ",
                loaded.language_b, loaded.language_a
            );
            let direction = match console.choose(&prompt, &["1", "2"]).as_deref() {
                Some("1") => Direction::AskA,
                Some(_) => Direction::AskB,
                None => return Ok(()),
            };
            let shuffle = console.confirm("Do you want to shuffle the words?");
            let mut session =
                TrainingSession::new(&key, loaded, SessionConfig { direction, shuffle })?;
            let mut rng = config.rng();
            train(&mut session, &mut console, &mut store, &mut rng)?;
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("language_trainer=warn")),
        )
        .init();

    let args = Args::parse();
    run(args)
}
