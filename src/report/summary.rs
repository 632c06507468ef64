//! IV ranking and per-bin tables for the terminal

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{IvAnalysis, IvStrength};

/// Summary of an IV scoring run
#[derive(Debug, Default)]
pub struct IvSummary {
    pub analyses: Vec<IvAnalysis>,
    /// Features scoring below the minimum IV
    pub weak_features: Vec<String>,
    pub min_iv: f64,
}

impl IvSummary {
    pub fn new(analyses: Vec<IvAnalysis>, min_iv: f64) -> Self {
        let weak_features = crate::pipeline::features_below_iv(&analyses, min_iv);
        Self {
            analyses,
            weak_features,
            min_iv,
        }
    }

    /// Features at or above the minimum IV, in ranking order
    pub fn kept_features(&self) -> Vec<String> {
        self.analyses
            .iter()
            .filter(|a| !self.weak_features.contains(&a.feature_name))
            .map(|a| a.feature_name.clone())
            .collect()
    }

    /// Features in the leakage band (IV > 0.5)
    pub fn suspicious_features(&self) -> Vec<String> {
        self.analyses
            .iter()
            .filter(|a| a.strength == IvStrength::Suspicious)
            .map(|a| a.feature_name.clone())
            .collect()
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("INFORMATION VALUE RANKING").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let table = ranking_table(&self.analyses);
        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        println!();
        println!(
            "      {} of {} feature(s) at or above IV {:.2}",
            style(self.analyses.len() - self.weak_features.len()).green().bold(),
            self.analyses.len(),
            self.min_iv
        );
    }
}

/// One row per feature: rank, name, type, bins, IV and strength band
pub fn ranking_table(analyses: &[IvAnalysis]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Feature").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("Bins").add_attribute(Attribute::Bold),
        Cell::new("IV").add_attribute(Attribute::Bold),
        Cell::new("Strength").add_attribute(Attribute::Bold),
    ]);

    for (rank, analysis) in analyses.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&analysis.feature_name),
            Cell::new(analysis.feature_type),
            Cell::new(analysis.bins.len()).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", analysis.iv)).set_alignment(CellAlignment::Right),
            Cell::new(analysis.strength).fg(strength_color(analysis.strength)),
        ]);
    }

    table
}

/// Per-bin Good/Bad distributions, WoE and IV contribution of one feature
pub fn bin_table(analysis: &IvAnalysis) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        ["Bin", "Total", "Good", "Bad", "Dist Good", "Dist Bad", "WoE", "IV"]
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
    );

    for bin in &analysis.bins {
        table.add_row(vec![
            Cell::new(&bin.label),
            Cell::new(bin.total).set_alignment(CellAlignment::Right),
            Cell::new(bin.good).set_alignment(CellAlignment::Right),
            Cell::new(bin.bad).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", bin.dist_good)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", bin.dist_bad)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", bin.woe)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", bin.iv_contribution)).set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

/// Print the bin table of a feature with a heading
pub fn display_bins(analysis: &IvAnalysis) {
    println!();
    println!(
        "    {} {} {}",
        style(&analysis.feature_name).cyan().bold(),
        style("│").dim(),
        style(format!("IV {:.4} ({})", analysis.iv, analysis.strength)).dim()
    );
    for line in bin_table(analysis).to_string().lines() {
        println!("    {}", line);
    }
}

fn strength_color(strength: IvStrength) -> Color {
    match strength {
        IvStrength::NotPredictive => Color::DarkGrey,
        IvStrength::Weak => Color::White,
        IvStrength::Medium => Color::Cyan,
        IvStrength::Strong => Color::Green,
        IvStrength::Suspicious => Color::Red,
    }
}
