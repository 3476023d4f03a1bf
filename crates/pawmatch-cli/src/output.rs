//! Output renderers and formatting helpers for CLI commands.

use std::io::Write;

use anyhow::anyhow;
use pawmatch_core::{BreedList, FavoriteSet, Item, PageBounds, ResultRow, SearchController};
use serde_json::{Value, json};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn write_json(out: &mut dyn Write, value: &Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    writeln!(out, "{text}")?;
    Ok(())
}

fn item_json(item: &Item, favorited: bool) -> Value {
    json!({
        "id": item.id,
        "name": item.name,
        "breed": item.breed,
        "age": item.age,
        "zip_code": item.zip_code,
        "img": item.img,
        "favorited": favorited,
    })
}

fn write_item_table(out: &mut dyn Write, rows: &[ResultRow]) -> CliResult<()> {
    writeln!(
        out,
        "{:>3} {:<22} {:<18} {:<24} {:>4} {:<6} FAV",
        "#", "ID", "NAME", "BREED", "AGE", "ZIP"
    )?;
    for (index, row) in rows.iter().enumerate() {
        let item = &row.item;
        writeln!(
            out,
            "{:>3} {:<22} {:<18} {:<24} {:>4} {:<6} {}",
            index + 1,
            item.id,
            truncate(&item.name, 18),
            truncate(&item.breed, 24),
            item.age,
            item.zip_code,
            if row.favorited { "*" } else { "" }
        )?;
    }
    Ok(())
}

pub(crate) fn render_breeds(
    out: &mut dyn Write,
    list: &BreedList,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(out, &json!(list.breeds)),
        OutputFormat::Table => {
            for breed in &list.breeds {
                writeln!(out, "{breed}")?;
            }
            Ok(())
        }
    }
}

pub(crate) fn render_results(
    out: &mut dyn Write,
    controller: &SearchController,
    favorites: &FavoriteSet,
    format: OutputFormat,
) -> CliResult<()> {
    let rows = controller.results().rows(favorites);
    let bounds = controller.results().bounds;
    let descriptor = controller.descriptor();
    let sort = descriptor.sort.effective().to_param();
    match format {
        OutputFormat::Json => write_json(
            out,
            &json!({
                "page": bounds.page,
                "page_size": bounds.page_size,
                "total": bounds.total,
                "total_pages": bounds.total_pages,
                "sort": sort,
                "breeds": descriptor.categories,
                "results": rows
                    .iter()
                    .map(|row| item_json(&row.item, row.favorited))
                    .collect::<Vec<_>>(),
            }),
        ),
        OutputFormat::Table => {
            if rows.is_empty() {
                writeln!(out, "No dogs found. Try adjusting your filters.")?;
            } else {
                write_item_table(out, &rows)?;
            }
            let filters = if descriptor.categories.is_empty() {
                "all breeds".to_string()
            } else {
                descriptor
                    .categories
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            writeln!(
                out,
                "{} | sort {} ({}) | {}",
                page_summary(&bounds),
                sort,
                descriptor.sort.direction.label(),
                filters
            )?;
            Ok(())
        }
    }
}

pub(crate) fn render_items(
    out: &mut dyn Write,
    items: &[Item],
    favorites: &FavoriteSet,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(
            out,
            &Value::Array(
                items
                    .iter()
                    .map(|item| item_json(item, favorites.contains(&item.id)))
                    .collect(),
            ),
        ),
        OutputFormat::Table => {
            let rows: Vec<ResultRow> = items
                .iter()
                .map(|item| ResultRow {
                    favorited: favorites.contains(&item.id),
                    item: item.clone(),
                })
                .collect();
            write_item_table(out, &rows)
        }
    }
}

pub(crate) fn render_match(out: &mut dyn Write, item: &Item, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(out, &json!({ "match": item_json(item, true) })),
        OutputFormat::Table => {
            writeln!(out, "You've been matched!")?;
            writeln!(out, "  name:  {}", item.name)?;
            writeln!(out, "  breed: {}", item.breed)?;
            writeln!(out, "  age:   {}", item.age)?;
            writeln!(out, "  zip:   {}", item.zip_code)?;
            writeln!(out, "  image: {}", item.img)?;
            writeln!(out, "  id:    {}", item.id)?;
            Ok(())
        }
    }
}

/// `Showing 21-40 of 123 (page 2 of 7)`.
pub(crate) fn page_summary(bounds: &PageBounds) -> String {
    if bounds.total == 0 {
        return format!("No results (page {})", bounds.page);
    }
    format!(
        "Showing {}-{} of {} (page {} of {})",
        bounds.first, bounds.last, bounds.total, bounds.page, bounds.total_pages
    )
}

pub(crate) fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let kept: String = value.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawmatch_core::MemoryFavoritesStore;

    fn item(id: &str) -> Item {
        Item {
            id: id.into(),
            img: "https://img.example/x.jpg".into(),
            name: "Biscuit".into(),
            age: 2,
            zip_code: "94110".into(),
            breed: "Labrador Retriever".into(),
        }
    }

    #[test]
    fn page_summary_formats_window() {
        assert_eq!(
            page_summary(&PageBounds::compute(2, 20, 123)),
            "Showing 21-40 of 123 (page 2 of 7)"
        );
        assert_eq!(page_summary(&PageBounds::compute(1, 20, 0)), "No results (page 1)");
    }

    #[test]
    fn truncate_marks_cut_values() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Labrador Retriever", 8), "Labrado~");
    }

    #[test]
    fn items_table_marks_favorites() -> anyhow::Result<()> {
        let mut favorites = FavoriteSet::open(Box::new(MemoryFavoritesStore::default()));
        favorites.toggle("b");
        let mut buffer = Vec::new();
        render_items(&mut buffer, &[item("a"), item("b")], &favorites, OutputFormat::Table)
            .map_err(|err| anyhow!(err.display_message()))?;
        let text = String::from_utf8(buffer)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(!lines[1].trim_end().ends_with('*'));
        assert!(lines[2].trim_end().ends_with('*'));
        Ok(())
    }

    #[test]
    fn match_json_wraps_item() -> anyhow::Result<()> {
        let mut buffer = Vec::new();
        render_match(&mut buffer, &item("z"), OutputFormat::Json)
            .map_err(|err| anyhow!(err.display_message()))?;
        let value: Value = serde_json::from_slice(&buffer)?;
        assert_eq!(value["match"]["id"], "z");
        assert_eq!(value["match"]["zip_code"], "94110");
        Ok(())
    }
}
