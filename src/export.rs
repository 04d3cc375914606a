use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::batch::BatchReport;

/// `1234567.8` -> `€1,234,568`
pub fn format_eur(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        format!("-€{out}")
    } else {
        format!("€{out}")
    }
}

pub fn export_valuations(path: &Path, report: &BatchReport, model_path: &Path) -> Result<()> {
    let mut rows = vec![vec![
        "Rank".to_string(),
        "Player".to_string(),
        "Position".to_string(),
        "Age".to_string(),
        "Height (cm)".to_string(),
        "Weight (kg)".to_string(),
        "Potential".to_string(),
        "Stamina".to_string(),
        "Dribbling".to_string(),
        "Short Passing".to_string(),
        "Value".to_string(),
        "Log Value".to_string(),
    ]];
    for (idx, v) in report.valuations.iter().enumerate() {
        let p = &v.player;
        rows.push(vec![
            (idx + 1).to_string(),
            p.name.clone().unwrap_or_default(),
            p.best_position.to_string(),
            p.age.to_string(),
            p.height_cm.to_string(),
            p.weight_kg.to_string(),
            format!("{:.0}", p.potential),
            format!("{:.0}", p.stamina),
            format!("{:.0}", p.dribbling),
            format!("{:.0}", p.short_passing),
            format_eur(v.prediction.value),
            format!("{:.4}", v.prediction.log_value),
        ]);
    }

    let mut meta_rows = vec![
        vec!["Key".to_string(), "Value".to_string()],
        vec!["Model".to_string(), model_path.display().to_string()],
        vec!["Players".to_string(), report.valuations.len().to_string()],
        vec!["Errors".to_string(), report.errors.len().to_string()],
        vec!["Generated".to_string(), chrono::Utc::now().to_rfc3339()],
    ];
    meta_rows.extend(
        report
            .errors
            .iter()
            .map(|e| vec!["Error".to_string(), e.clone()]),
    );

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Valuations")?;
        write_rows(sheet, &rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Meta")?;
        write_rows(sheet, &meta_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
