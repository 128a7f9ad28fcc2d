use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    Table,
    /// Pretty-printed JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

pub struct OutputManager {
    format: OutputFormat,
    quiet: bool,
}

impl OutputManager {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn print_list<T>(&self, items: &[T]) -> anyhow::Result<()>
    where
        T: Serialize + Tabled,
    {
        if self.quiet {
            return Ok(());
        }
        println!("{}", self.render_list(items)?);
        Ok(())
    }

    pub fn print_item<T>(&self, item: &T) -> anyhow::Result<()>
    where
        T: Serialize + Tabled,
    {
        if self.quiet {
            return Ok(());
        }
        match self.format {
            OutputFormat::Table => println!("{}", Table::new([item])),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(item)?),
        }
        Ok(())
    }

    /// Rows whose columns are only known at runtime, such as catalog data.
    pub fn print_records(
        &self,
        records: &[serde_json::Map<String, serde_json::Value>],
    ) -> anyhow::Result<()> {
        if self.quiet {
            return Ok(());
        }
        match self.format {
            OutputFormat::Table if records.is_empty() => println!("No items found"),
            OutputFormat::Table => println!("{}", records_table(records)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        }
        Ok(())
    }

    /// Raw JSON responses print as-is in both formats.
    pub fn print_json(&self, value: &serde_json::Value) -> anyhow::Result<()> {
        if !self.quiet {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(())
    }

    pub fn print_success_message(&self, message: &str) {
        if !self.quiet {
            println!("{}", message.green());
        }
    }

    pub fn print_notice(&self, message: &str) {
        if !self.quiet && self.format == OutputFormat::Table {
            println!("{}", message.yellow());
        }
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{}", message.red());
    }

    fn render_list<T>(&self, items: &[T]) -> anyhow::Result<String>
    where
        T: Serialize + Tabled,
    {
        Ok(match self.format {
            OutputFormat::Table if items.is_empty() => "No items found".to_string(),
            OutputFormat::Table => Table::new(items).to_string(),
            OutputFormat::Json => serde_json::to_string_pretty(items)?,
        })
    }
}

/// Columns in first-seen order across all records.
fn records_table(records: &[serde_json::Map<String, serde_json::Value>]) -> Table {
    let mut columns: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().copied());
    for record in records {
        builder.push_record(columns.iter().map(|c| match record.get(*c) {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }));
    }
    builder.build()
}
