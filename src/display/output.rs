use crate::analysis::archetype::Classification;
use crate::analysis::counter::CounterResult;
use crate::analysis::oracle::BestMatch;
use crate::analysis::win_rates::{CardRecord, MetaEntry};
use crate::data::catalog::{Card, CardId};
use crate::data::corpus::LoadReport;
use colored::*;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct CardRow {
    id: String,
    name: String,
    rarity: String,
    #[tabled(rename = "type")]
    card_type: String,
    elixir: String,
}

#[derive(Tabled)]
struct DeckRow {
    #[tabled(rename = "#")]
    slot: String,
    card: String,
    id: String,
}

#[derive(Tabled)]
struct WinRateRow {
    rank: String,
    card: String,
    matches: String,
    wins: String,
    win_rate: String,
}

#[derive(Tabled)]
struct MetaRow {
    rank: String,
    wins: String,
    archetype: String,
    deck: String,
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_warning(message: &str) {
    println!("{} {}", "⚠️".yellow(), message.yellow());
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn display_load_report(report: &LoadReport, seconds: f64) {
    display_success(&format!(
        "Loaded {} matches in {:.1}s ({} malformed rows dropped)",
        report.kept, seconds, report.dropped
    ));
}

fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

pub fn display_cards(cards: &[&Card]) {
    if cards.is_empty() {
        display_warning("No cards match that search");
        return;
    }

    let rows: Vec<CardRow> = cards
        .iter()
        .map(|c| CardRow {
            id: c.id.to_string(),
            name: c.name.clone(),
            rarity: c.rarity.to_string(),
            card_type: c.card_type.to_string(),
            elixir: format!("{}", c.elixir),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
}

pub fn display_deck(title: &str, deck: &[CardId], names: &[String]) {
    println!("{}", title.bold().yellow());
    let rows: Vec<DeckRow> = deck
        .iter()
        .zip(names)
        .enumerate()
        .map(|(i, (id, name))| DeckRow {
            slot: format!("{}", i + 1),
            card: name.clone(),
            id: id.to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

pub fn display_classification(classification: Option<&Classification>) {
    match classification {
        Some(c) => println!(
            "{} {}   {} {}\n",
            "🛡️ Archetype:".bold(),
            c.archetype.to_string().yellow().bold(),
            "💧 Average Elixir:".bold(),
            format!("{:.1}", c.average_elixir).green().bold()
        ),
        None => println!("{}\n", "Archetype unavailable for this deck".dimmed()),
    }
}

pub fn display_card_win_rate(card: &Card, record: &CardRecord) {
    println!("\n{}", format!("📊 {}", card.name).bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
    println!(
        "  {} {}   {} {}   {} {}",
        "Elixir:".bold(),
        card.elixir,
        "Rarity:".bold(),
        card.rarity,
        "Type:".bold(),
        card.card_type
    );
    if record.matches == 0 {
        println!("  {}\n", "Never seen in the corpus (win rate 0%)".yellow());
        return;
    }
    println!(
        "  {} {} over {} matches ({} wins)\n",
        "Win Rate:".bold(),
        percent(record.win_rate()).green(),
        record.matches,
        record.wins
    );
}

pub fn display_win_rates(rows: &[(CardId, CardRecord, String)]) {
    println!("\n{}", "📈 GLOBAL WIN RATES".bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());

    let rows: Vec<WinRateRow> = rows
        .iter()
        .enumerate()
        .map(|(idx, (_, record, name))| WinRateRow {
            rank: format!("#{}", idx + 1),
            card: name.clone(),
            matches: record.matches.to_string(),
            wins: record.wins.to_string(),
            win_rate: percent(record.win_rate()),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
}

pub fn display_counter(hated_name: &str, result: &CounterResult, counter_name: &str) {
    println!("\n{}", "🛡️ THE ANTI-META ENGINE".bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
    println!(
        "{} {}\n",
        "⚔️ Ultimate hard counter:".bold().green(),
        counter_name.bold()
    );
    println!("  {:<28} {}", "Global Win Rate", percent(result.global_win_rate));
    println!(
        "  {:<28} {} ({} games)",
        format!("Win Rate vs {}", hated_name),
        percent(result.matchup_win_rate),
        result.matchup.matches
    );
    let delta = format!("{:+.2}%", result.delta * 100.0);
    let delta = if result.delta >= 0.0 {
        delta.green()
    } else {
        delta.red()
    };
    println!("  {:<28} {}\n", "Synergy Spike (Delta)", delta);
    println!(
        "  Recommended deck is #{} in the meta pool\n",
        result.deck_rank + 1
    );
}

pub fn display_oracle(result: &BestMatch) {
    println!("\n{}", "🔮 THE ORACLE SEARCH".bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
    println!(
        "{} {} win probability (deck #{} of {} scored)\n",
        "✅ Target locked:".bold().green(),
        format!("{:.2}%", result.win_probability * 100.0).bold(),
        result.index + 1,
        result.pool_size
    );
}

pub fn display_meta_pool(entries: &[MetaEntry], describe: impl Fn(&MetaEntry) -> (String, String)) {
    println!("\n{}", "🏆 META POOL (most frequent winning decks)".bold().cyan());
    println!("{}\n", "=".repeat(80).cyan());

    if entries.is_empty() {
        display_warning("The corpus holds no winning decks");
        return;
    }

    let rows: Vec<MetaRow> = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let (archetype, deck) = describe(entry);
            MetaRow {
                rank: format!("#{}", idx + 1),
                wins: entry.wins.to_string(),
                archetype,
                deck,
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
}
