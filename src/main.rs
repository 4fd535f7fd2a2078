// Tue Jan 13 2026 - Alex

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use heap_classifier::{
    config::Config,
    heap::{FixedHeaderLayout, HeapLayout, HeapSegment, SegmentedHeap},
    memory::{MappedFile, MemoryView, NativeWord},
    rules::RuleGroupStore,
    session::AnalysisSession,
    typesystem::{DescribedTypeSystem, TypeSystem},
    utils::{pluralize, LoggingUtils},
};
use itertools::Itertools;
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author = "Alex")]
#[command(version = "0.1.0")]
#[command(about = "Reference classification for heap snapshots", long_about = None)]
struct Args {
    /// JSON config with default rule files, groups and type layout
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse rule files and list their groups
    Check { files: Vec<PathBuf> },
    /// Bind rules against a type layout and print the classified fields
    Bind {
        #[arg(short, long)]
        types: Option<PathBuf>,
        files: Vec<PathBuf>,
        #[arg(short, long)]
        group: Vec<String>,
    },
    /// Print the classified pointer slots of one object in a raw heap dump
    Pointers {
        #[arg(short, long)]
        types: Option<PathBuf>,
        /// Raw bytes of one heap segment
        #[arg(long)]
        heap: PathBuf,
        /// Address of the first byte of the dump
        #[arg(long, value_parser = parse_address)]
        base: u64,
        #[arg(long, value_parser = parse_address)]
        address: u64,
        /// Type index; read from the object header when omitted
        #[arg(long = "type")]
        type_index: Option<i32>,
        files: Vec<PathBuf>,
    },
}

fn parse_address(text: &str) -> Result<u64, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", text, e))
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "[!]".red(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::new(),
    };
    if args.no_color {
        config.color = false;
    }
    colored::control::set_override(config.color);

    let base = LoggingUtils::level_from_str(&config.log_level).unwrap_or(LevelFilter::Warn);
    LoggingUtils::init_logger(LoggingUtils::level_from_verbosity(base, args.verbose), config.color);

    match args.command {
        Command::Check { files } => check(&config, files),
        Command::Bind { types, files, group } => {
            let config = merge(config, types, files, group);
            bind(&config)
        }
        Command::Pointers {
            types,
            heap,
            base,
            address,
            type_index,
            files,
        } => {
            let config = merge(config, types, files, Vec::new());
            pointers(&config, heap, base, address, type_index)
        }
    }
}

/// Command line values on top of the config file.
fn merge(mut config: Config, types: Option<PathBuf>, files: Vec<PathBuf>, groups: Vec<String>) -> Config {
    if let Some(types) = types {
        config = config.with_type_layout(types);
    }
    for file in files {
        config = config.with_rule_file(file);
    }
    if !groups.is_empty() {
        config = config.with_active_groups(groups);
    }
    config
}

fn check(config: &Config, files: Vec<PathBuf>) -> Result<()> {
    let files = if files.is_empty() { config.rule_files.clone() } else { files };
    if files.is_empty() {
        bail!("no rule files given");
    }

    let mut store = RuleGroupStore::new();
    for file in &files {
        store
            .load_file(file)
            .with_context(|| format!("loading rules from {}", file.display()))?;
        println!("{} Parsed {}", "[+]".green(), file.display());
    }

    println!();
    for group in store.groups() {
        println!(
            "{} {}",
            group.name().cyan().bold(),
            format!("({})", pluralize(group.rules().len(), "rule", "rules")).dimmed()
        );
        for rule in group.rules() {
            println!("    {:<28} {}", rule.location.to_string().dimmed(), rule);
        }
    }
    println!();
    println!(
        "{} {} in {}",
        "[*]".blue(),
        pluralize(store.rule_count(), "rule", "rules"),
        pluralize(store.len(), "group", "groups")
    );
    Ok(())
}

fn load_session(config: &Config) -> Result<(Arc<DescribedTypeSystem>, AnalysisSession)> {
    let path = config
        .type_layout
        .as_ref()
        .ok_or_else(|| anyhow!("no type layout; pass --types or set type_layout in the config"))?;
    let type_system = Arc::new(
        DescribedTypeSystem::load(path).with_context(|| format!("loading type layout {}", path.display()))?,
    );
    println!(
        "{} Loaded {} from {}",
        "[+]".green(),
        pluralize(type_system.number_of_types() as usize, "type", "types"),
        path.display()
    );

    let session = AnalysisSession::from_config(type_system.clone(), config)?;
    println!(
        "{} Active groups: {}",
        "[*]".blue(),
        session.groups().enabled_group_names().iter().join(", ")
    );
    Ok((type_system, session))
}

fn print_warnings(session: &AnalysisSession) {
    let warnings = session.warnings().all();
    if warnings.is_empty() {
        return;
    }
    println!();
    println!("{}", pluralize(warnings.len(), "warning", "warnings").yellow().bold());
    for (phase, message) in warnings {
        println!("    {} {}", format!("[{}]", phase).yellow(), message);
    }
}

fn bind(config: &Config) -> Result<()> {
    let (type_system, mut session) = load_session(config)?;
    let ruleset = session.ruleset();

    println!();
    for ((type_index, field), flags) in ruleset.slots() {
        let location = ruleset
            .get_location(type_index, field)
            .map(|l| l.to_string())
            .unwrap_or_default();
        println!(
            "{:<48} {:<36} {}",
            type_system.describe_field(type_index, field),
            flags.to_string().green(),
            location.dimmed()
        );

        let weights = ruleset.get_weight_anchor_selectors(type_index, field);
        let tags = ruleset.get_tag_anchor_selectors(type_index, field);
        let conditions = ruleset.get_condition_anchor_selectors(type_index, field);
        for anchor in weights {
            println!("    {} {} ({})", "owns".cyan(), anchor.selector.describe(type_system.as_ref()), anchor.weight);
        }
        for anchor in tags {
            println!("    {} {} [{}]", "tags".cyan(), anchor.selector.describe(type_system.as_ref()), anchor.tags.join(", "));
        }
        for anchor in conditions {
            println!("    {} {}", "fuse".cyan(), anchor.selector.describe(type_system.as_ref()));
        }
        let (zero, nonzero) = ruleset.get_tags(type_index, field);
        if !zero.is_empty() || !nonzero.is_empty() {
            println!("    {} zero [{}] nonzero [{}]", "cond".cyan(), zero.join(", "), nonzero.join(", "));
        }
    }

    println!();
    println!(
        "{} {}",
        "[*]".blue(),
        pluralize(ruleset.len(), "classified field", "classified fields")
    );
    print_warnings(&session);
    Ok(())
}

fn pointers(config: &Config, heap: PathBuf, base: u64, address: u64, type_index: Option<i32>) -> Result<()> {
    let (type_system, mut session) = load_session(config)?;
    let native = type_system.pointer_size();

    let dump = MappedFile::open(&heap).with_context(|| format!("mapping {}", heap.display()))?;
    let segment = HeapSegment::new(native.word(base), MemoryView::whole(Arc::new(dump)), false);
    let heap = Arc::new(SegmentedHeap::new(native, vec![segment])?);

    let mut layout = FixedHeaderLayout::new(native, 0, native.size() as u64);
    for (word, index) in type_system.type_words() {
        layout.register_type(word, index);
    }

    let address: NativeWord = native.word(address);
    let type_index = match type_index {
        Some(index) => index,
        None => {
            let view = heap
                .get_memory_view_for_address(address)
                .ok_or_else(|| anyhow!("{} is outside the heap dump", address))?;
            layout
                .type_index_of(&view)
                .ok_or_else(|| anyhow!("unknown type word at {}; pass --type", address))?
        }
    };

    let interpreter = session.interpreter(heap, Arc::new(layout));
    let slots = interpreter.get_pointers(address, type_index)?;
    println!();
    println!("{} {}", type_system.qualified_name(type_index).cyan().bold(), address);
    for slot in &slots {
        println!(
            "    {:<44} {} {}",
            type_system.describe_field(slot.type_index, slot.field_number),
            slot.value,
            slot.flags.to_string().green()
        );
        for (child, _) in interpreter.get_owning_references_from_anchor(address, slot)? {
            println!("        {} {}", "fuses".cyan(), child);
        }
        for reference in interpreter.get_weighted_references_from_anchor(address, slot)? {
            println!("        {} {} ({}, {})", "owns".cyan(), reference.child, reference.weight, reference.location);
        }
        for reference in interpreter.get_tags_from_anchor(address, slot)? {
            println!("        {} {} [{}]", "tags".cyan(), reference.target, reference.tags.join(", "));
        }
        let tags = interpreter.conditional_tags(slot);
        if !tags.is_empty() {
            println!("        {} [{}]", "tags".cyan(), tags.join(", "));
        }
    }
    println!();
    println!("{} {}", "[*]".blue(), pluralize(slots.len(), "pointer slot", "pointer slots"));
    print_warnings(&session);
    Ok(())
}
