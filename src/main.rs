//! wachat - WhatsApp chat export parser CLI
//!
//! Main entry point for the wachat command-line tool.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::generate;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::debug;

use wachat::*;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_cli_logging(cli.quiet, cli.verbose);

    let mut config = Config::load();
    if cli.no_color {
        config.output.colors = false;
    }
    if cli.quiet {
        config.output.quiet = true;
    }
    if cli.timings {
        config.output.timings = true;
    }
    if !config.output.colors {
        colored::control::set_override(false);
    }

    let result = match &cli.command {
        Commands::Parse(args) => cmd_parse(&cli, &config, args),
        Commands::Stats(args) => cmd_stats(&cli, &config, args),
        Commands::Config(args) => cmd_config(&config, args),
        Commands::Completions(args) => cmd_completions(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(chat_err) = e.downcast_ref::<ChatError>() {
                eprintln!("{}", format_chat_error(chat_err));
            } else {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

/// `--format`, else the configured format, else text.
fn output_format(cli: &Cli, config: &Config) -> OutputFormat {
    cli.format.unwrap_or_else(|| {
        <OutputFormat as ValueEnum>::from_str(&config.output.format, true).unwrap_or_default()
    })
}

fn parse_options(config: &Config, args: &cli::ArchiveArgs) -> ParseOptions {
    let mut options = ParseOptions::from(&config.parse);
    if args.no_media {
        options.decode_media = false;
    }
    if let Some(suffix) = &args.transcript_suffix {
        options.transcript_suffix.clone_from(suffix);
    }
    options
}

fn load_export(config: &Config, args: &cli::ArchiveArgs, show_spinner: bool) -> Result<ChatExport> {
    let parser = ExportParser::new(&args.archive).with_options(parse_options(config, args));
    debug!(options = ?parser.options(), "Parsing {}", args.archive.display());

    let spinner = if show_spinner {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .context("invalid spinner template")?,
        );
        pb.set_message(format!("Reading {}", parser.chat_name()));
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let result = parser.parse();
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let export = result?;

    if config.output.timings {
        eprintln!(
            "{}",
            format!("Parsed {} messages in {:.1?}", export.len(), start.elapsed()).dimmed()
        );
    }
    Ok(export)
}

fn cmd_parse(cli: &Cli, config: &Config, args: &cli::ParseArgs) -> Result<()> {
    let format = output_format(cli, config);
    let interactive = format == OutputFormat::Text && !config.output.quiet;
    let export = load_export(config, &args.archive, interactive)?;

    let categories: Option<Vec<MessageCategory>> = args
        .category
        .as_ref()
        .map(|list| list.iter().copied().map(MessageCategory::from).collect());
    let sender = args.sender.as_ref().map(|s| s.to_lowercase());

    let selected: Vec<&Message> = export
        .messages
        .iter()
        .filter(|m| {
            categories
                .as_ref()
                .is_none_or(|cats| cats.contains(&m.category()))
        })
        .filter(|m| {
            sender
                .as_ref()
                .is_none_or(|s| m.sender.to_lowercase() == *s)
        })
        .take(args.limit.unwrap_or(usize::MAX))
        .collect();

    match format {
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let view = serde_json::json!({
                "chat_name": export.chat_name,
                "messages": selected,
            });
            let json = if format == OutputFormat::JsonPretty {
                serde_json::to_string_pretty(&view)?
            } else {
                serde_json::to_string(&view)?
            };
            println!("{json}");
        }
        OutputFormat::Csv => {
            println!(
                "timestamp,sender,category,filename,extension,size_bytes,duration,width,height,text"
            );
            for m in &selected {
                println!("{}", csv_row(m));
            }
        }
        OutputFormat::Compact => {
            for m in &selected {
                println!(
                    "[{}] {} ({}) {}",
                    m.timestamp.format("%Y-%m-%d %H:%M"),
                    m.sender,
                    m.category(),
                    m.text()
                        .map_or_else(|| describe_media(m), |t| truncate(&t.replace('\n', " "), 100))
                );
            }
        }
        OutputFormat::Text => {
            if !args.no_summary && !config.output.quiet {
                print_summary(&export);
            }
            if selected.is_empty() {
                println!("{}", "No messages to show.".yellow());
            }
            for (i, m) in selected.iter().enumerate() {
                print_message(i + 1, m);
            }
        }
    }

    Ok(())
}

fn csv_row(m: &Message) -> String {
    let attachment = m.attachment();
    let (width, height) = m
        .dimensions()
        .map_or((String::new(), String::new()), |(w, h)| {
            (w.to_string(), h.to_string())
        });
    format!(
        "{},\"{}\",{},\"{}\",{},{},{},{},{},\"{}\"",
        m.timestamp.format("%Y-%m-%dT%H:%M:%S"),
        csv_escape_text(&m.sender),
        m.category(),
        attachment.map_or_else(String::new, |a| csv_escape_text(&a.filename)),
        attachment.map_or("", |a| a.extension.as_str()),
        attachment.map_or_else(String::new, |a| a.size_bytes.to_string()),
        m.duration().map_or_else(String::new, |d| d.to_string()),
        width,
        height,
        m.text().map_or_else(String::new, csv_escape_text),
    )
}

/// One-line description of an attachment: name, size and whatever
/// metadata the category carries.
fn describe_media(m: &Message) -> String {
    let Some(attachment) = m.attachment() else {
        return String::new();
    };
    let mut parts = vec![
        attachment.filename.clone(),
        format_bytes(attachment.size_bytes),
    ];
    if let Some(duration) = m.duration() {
        parts.push(duration.to_string());
    }
    if let Some((w, h)) = m.dimensions() {
        parts.push(format!("{w}x{h}"));
    }
    parts.join(", ")
}

fn print_summary(export: &ChatExport) {
    let stats = export.stats();
    println!("{}", format!("Chat with {}", export.chat_name).bold().cyan());
    println!("{}", "─".repeat(HEADER_DIVIDER_WIDTH));
    println!(
        "  {} messages from {} senders",
        format_number_usize(stats.total_messages).cyan(),
        format_number_usize(stats.sender_count).cyan()
    );
    let media: Vec<String> = MessageCategory::ALL
        .iter()
        .filter(|c| c.is_media() && stats.count(**c) > 0)
        .map(|c| format!("{} {}", stats.count(*c), c))
        .collect();
    if !media.is_empty() {
        println!(
            "  {} ({})",
            media.join(", "),
            format_bytes(stats.media_bytes).dimmed()
        );
    }
    println!("{}", "─".repeat(HEADER_DIVIDER_WIDTH));
    println!();
}

fn print_message(num: usize, m: &Message) {
    let badge = match m.category() {
        MessageCategory::Text => "TEXT".on_blue(),
        MessageCategory::Image => "IMAGE".on_magenta(),
        MessageCategory::Video => "VIDEO".on_red(),
        MessageCategory::Audio => "AUDIO".on_green(),
        MessageCategory::Document => "DOC".on_yellow(),
        MessageCategory::Sticker => "STICKER".on_cyan(),
    };

    println!(
        "{}. {} {} {}",
        num.to_string().dimmed(),
        badge,
        m.sender.bold(),
        m.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed()
    );

    if let Some(text) = m.text() {
        for line in textwrap::wrap(text, 78) {
            println!("   {line}");
        }
    } else {
        println!("   {}", describe_media(m));
    }
    println!();
}

fn cmd_stats(cli: &Cli, config: &Config, args: &cli::StatsArgs) -> Result<()> {
    let format = output_format(cli, config);
    let interactive = format == OutputFormat::Text && !config.output.quiet;
    let export = load_export(config, &args.archive, interactive)?;
    let stats = export.stats();

    match format {
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let view = serde_json::json!({
                "chat_name": export.chat_name,
                "stats": stats,
            });
            let json = if format == OutputFormat::JsonPretty {
                serde_json::to_string_pretty(&view)?
            } else {
                serde_json::to_string(&view)?
            };
            println!("{json}");
        }
        OutputFormat::Csv => {
            println!("category,count");
            for category in MessageCategory::ALL {
                println!("{},{}", category, stats.count(category));
            }
        }
        OutputFormat::Compact => {
            let counts: Vec<String> = MessageCategory::ALL
                .iter()
                .map(|c| format!("{}={}", c, stats.count(*c)))
                .collect();
            println!(
                "{}: {} messages, {}, media={}B, play={}s",
                export.chat_name,
                stats.total_messages,
                counts.join(" "),
                stats.media_bytes,
                stats.media_seconds
            );
        }
        OutputFormat::Text => {
            println!("{}", format!("Chat with {}", export.chat_name).bold().cyan());
            println!("{}", "─".repeat(40));
            for category in MessageCategory::ALL {
                println!(
                    "  {:<20} {:>10}",
                    format!("{category}:"),
                    format_number_usize(stats.count(category))
                );
            }
            println!("{}", "─".repeat(40));
            println!(
                "  {:<20} {:>10}",
                "Total:",
                format_number_usize(stats.total_messages)
            );
            println!(
                "  {:<20} {:>10}",
                "Senders:",
                format_number_usize(stats.sender_count)
            );
            println!(
                "  {:<20} {:>10}",
                "Media size:",
                format_bytes(stats.media_bytes)
            );
            println!(
                "  {:<20} {:>10}",
                "Play time:",
                format_play_time(stats.media_seconds)
            );

            if let (Some(first), Some(last)) = (stats.first_timestamp, stats.last_timestamp) {
                println!(
                    "  First message: {}",
                    first.format("%Y-%m-%d %H:%M").to_string().green()
                );
                println!(
                    "  Last message:  {}",
                    last.format("%Y-%m-%d %H:%M").to_string().green()
                );
            }
        }
    }

    Ok(())
}

fn cmd_config(config: &Config, args: &cli::ConfigArgs) -> Result<()> {
    let path = Config::user_config_path();

    if args.init {
        match &path {
            Some(existing) if existing.exists() => {
                println!(
                    "{} {}",
                    "Config already exists:".yellow(),
                    existing.display()
                );
            }
            _ => {
                let written = Config::default().save()?;
                println!("{} {}", "✓".green(), written.display());
            }
        }
    }

    if args.path {
        match &path {
            Some(p) => println!("{}", p.display()),
            None => println!("{}", "No config directory on this platform.".yellow()),
        }
    }

    if args.show || !(args.init || args.path) {
        println!("{}", "Current Configuration".bold().cyan());
        println!("{}", "─".repeat(CONTENT_DIVIDER_WIDTH));
        print!("{}", toml::to_string_pretty(config)?);
    }

    Ok(())
}

fn cmd_completions(args: &cli::CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "wachat", &mut io::stdout());
    Ok(())
}
