//! Spreadsheet and print exports of the check-in list

use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};
use hadir_config::EventConfig;
use hadir_ipc::CheckInRecord;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};
use tracing::debug;

use crate::error::AppError;

pub const SHEET_NAME: &str = "Daftar Hadir";

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADERS: [&str; 6] = ["NO", "WAKTU", "NAMA", "JABATAN", "INSTANSI", "TTD"];

const COLUMN_WIDTHS: [f64; 6] = [5.0, 14.0, 25.0, 25.0, 30.0, 15.0];

/// Zero-based rows of the sheet layout
const TITLE_ROW: u32 = 0;
const SUMMARY_ROW: u32 = 2;
const HEADER_ROW: u32 = 4;
const FIRST_DATA_ROW: u32 = 5;

/// Title merges across A..G; the export date sits in G
const LAST_COL: u16 = 6;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

const WEEKDAYS: [&str; 7] = ["Minggu", "Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu"];

/// Labels and local time zone for rendered exports
#[derive(Debug, Clone)]
pub struct ExportContext {
    pub title: String,
    pub prefix: String,
    pub offset: FixedOffset,
}

impl ExportContext {
    pub fn from_config(event: &EventConfig) -> Self {
        let offset = FixedOffset::east_opt(event.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix());
        Self {
            title: event.title.clone(),
            prefix: event.export_prefix.clone(),
            offset,
        }
    }

    fn local(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.offset)
    }

    /// `dd Mon HH:MM` in local time
    pub fn check_in_time(&self, at: DateTime<Utc>) -> String {
        let local = self.local(at);
        format!(
            "{:02} {} {:02}:{:02}",
            local.day(),
            MONTHS[local.month0() as usize],
            local.hour(),
            local.minute()
        )
    }

    /// `d/m/yyyy` in local time
    pub fn export_date(&self, at: DateTime<Utc>) -> String {
        let local = self.local(at);
        format!("{}/{}/{}", local.day(), local.month(), local.year())
    }

    pub fn weekday(&self, at: DateTime<Utc>) -> &'static str {
        WEEKDAYS[self.local(at).weekday().num_days_from_sunday() as usize]
    }

    pub fn xlsx_filename(&self, now: DateTime<Utc>) -> String {
        format!("{}_{}.xlsx", self.prefix, now.timestamp_millis())
    }
}

/// One written cell of the sheet
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetCell {
    pub row: u32,
    pub col: u16,
    pub value: CellValue,
}

fn text(row: u32, col: u16, value: impl Into<String>) -> SheetCell {
    SheetCell {
        row,
        col,
        value: CellValue::Text(value.into()),
    }
}

/// Every cell below the title, in row order
pub fn sheet_cells(
    ctx: &ExportContext,
    records: &[CheckInRecord],
    now: DateTime<Utc>,
) -> Vec<SheetCell> {
    let mut cells = vec![
        text(SUMMARY_ROW, 0, format!("Total: {} peserta", records.len())),
        text(SUMMARY_ROW, LAST_COL, format!("Export: {}", ctx.export_date(now))),
    ];
    cells.extend(
        HEADERS
            .iter()
            .enumerate()
            .map(|(col, header)| text(HEADER_ROW, col as u16, *header)),
    );

    for (index, record) in records.iter().enumerate() {
        let row = FIRST_DATA_ROW + index as u32;
        cells.push(SheetCell {
            row,
            col: 0,
            value: CellValue::Number((index + 1) as f64),
        });
        cells.push(text(row, 1, ctx.check_in_time(record.check_in)));
        cells.push(text(row, 2, record.nama.clone()));
        cells.push(text(row, 3, record.jabatan.clone()));
        cells.push(text(row, 4, record.departemen_instansi.clone()));
        cells.push(text(row, 5, ""));
    }
    cells
}

/// Render the check-in list as an `.xlsx` workbook
pub fn build_xlsx(
    ctx: &ExportContext,
    records: &[CheckInRecord],
    now: DateTime<Utc>,
) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let title_format = Format::new()
        .set_bold()
        .set_font_size(14)
        .set_align(FormatAlign::Center);
    let header_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);
    let cell_format = Format::new().set_border(FormatBorder::Thin);

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    sheet.merge_range(TITLE_ROW, 0, TITLE_ROW, LAST_COL, &ctx.title, &title_format)?;

    for cell in sheet_cells(ctx, records, now) {
        let format = match cell.row {
            HEADER_ROW => Some(&header_format),
            row if row >= FIRST_DATA_ROW => Some(&cell_format),
            _ => None,
        };
        match (&cell.value, format) {
            (CellValue::Text(value), Some(format)) => {
                sheet.write_string_with_format(cell.row, cell.col, value, format)?;
            }
            (CellValue::Text(value), None) => {
                sheet.write_string(cell.row, cell.col, value)?;
            }
            (CellValue::Number(value), Some(format)) => {
                sheet.write_number_with_format(cell.row, cell.col, *value, format)?;
            }
            (CellValue::Number(value), None) => {
                sheet.write_number(cell.row, cell.col, *value)?;
            }
        }
    }

    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }

    let bytes = workbook.save_to_buffer()?;
    debug!("Built xlsx export: {} rows, {} bytes", records.len(), bytes.len());
    Ok(bytes)
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const PRINT_STYLE: &str = "\
@page { size: A4; margin: 12mm; }
* { box-sizing: border-box; }
body { font-family: Arial, sans-serif; font-size: 11px; color: #111; margin: 0; }
table { width: 100%; border-collapse: collapse; }
thead { display: table-header-group; }
tr { page-break-inside: avoid; }
th, td { border: 1px solid #999; padding: 4px 6px; vertical-align: middle; }
th { background: #f0f0f0; text-align: left; }
.title-cell { border: none; background: none; text-align: center; padding-bottom: 8px; }
h1 { font-size: 15px; margin: 0 0 4px; }
.meta { font-size: 11px; font-weight: normal; color: #444; }
.no { width: 32px; text-align: center; }
.ttd img { max-height: 40px; max-width: 110px; }
.ttd-empty { color: #999; }
";

/// Standalone HTML document for the browser's print/PDF dialog
pub fn print_html(ctx: &ExportContext, records: &[CheckInRecord], now: DateTime<Utc>) -> String {
    let mut rows = String::new();
    for (index, record) in records.iter().enumerate() {
        let ttd = match record.photo_ttd_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => format!(r#"<img src="{}" alt="TTD">"#, escape_html(url)),
            None => r#"<span class="ttd-empty">-</span>"#.to_string(),
        };
        rows.push_str(&format!(
            "<tr><td class=\"no\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"ttd\">{}</td></tr>\n",
            index + 1,
            escape_html(&ctx.check_in_time(record.check_in)),
            escape_html(&record.nama),
            escape_html(&record.jabatan),
            escape_html(&record.departemen_instansi),
            ttd
        ));
    }

    let title = escape_html(&ctx.title);
    format!(
        "<!DOCTYPE html>
<html lang=\"id\">
<head>
<meta charset=\"utf-8\">
<title>{title}</title>
<style>
{PRINT_STYLE}</style>
</head>
<body>
<table>
<thead>
<tr><th colspan=\"6\" class=\"title-cell\"><h1>{title}</h1><div class=\"meta\">Total: {total} peserta &middot; Export: {weekday}, {date}</div></th></tr>
<tr><th class=\"no\">No</th><th>Waktu</th><th>Nama</th><th>Jabatan</th><th>Instansi</th><th>TTD</th></tr>
</thead>
<tbody>
{rows}</tbody>
</table>
</body>
</html>
",
        total = records.len(),
        weekday = ctx.weekday(now),
        date = ctx.export_date(now),
    )
}
