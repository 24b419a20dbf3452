//! Status screen layout.
//!
//! Row 0: free memory, row 1: CPU usage, row 2: root filesystem usage,
//! row 3: local time. Each bar fills the columns left over by its label.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use lcdstat_hw::bar::CELL_DOTS;
use lcdstat_hw::Lcd;

use crate::sensors::SystemData;

/// Free memory label, e.g. `Mem: 42% `.
pub fn mem_label(free_percent: f64) -> String {
    format!("Mem:{:3.0}% ", free_percent)
}

/// CPU usage label, e.g. `CPU:  7% `.
pub fn cpu_label(percent: f64) -> String {
    format!("CPU:{:3.0}% ", percent)
}

/// Filesystem usage label, e.g. `Fs/:1234kB 56% `.
pub fn fs_label(used_kb: u64, used_percent: f64) -> String {
    format!("Fs/:{}kB {:.0}% ", used_kb, used_percent)
}

/// Time label, e.g. `Time: 12:34:56`.
pub fn time_label(time: &str) -> String {
    format!("Time: {}", time)
}

/// Bar width in dots for the columns left after `label`.
pub fn bar_dots(columns: usize, label: &str) -> usize {
    columns.saturating_sub(label.len()) * CELL_DOTS
}

fn fit(text: &str, columns: usize) -> &str {
    match text.char_indices().nth(columns) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Prints a label followed by a bar filled to `fraction`.
fn bar_row<I2C: I2c, D: DelayNs>(
    lcd: &mut Lcd<I2C, D>,
    row: usize,
    label: &str,
    fraction: f64,
) -> lcdstat_hw::Result<()> {
    let columns = lcd.geometry().columns();
    let label = fit(label, columns);
    let max = bar_dots(columns, label);
    let filled = (max as f64 * fraction.clamp(0.0, 1.0)) as usize;

    lcd.cursor_pos(row, 0)?;
    lcd.print(label)?;
    lcd.bar_display(filled, max)
}

fn text_row<I2C: I2c, D: DelayNs>(
    lcd: &mut Lcd<I2C, D>,
    row: usize,
    text: &str,
) -> lcdstat_hw::Result<()> {
    let columns = lcd.geometry().columns();
    lcd.cursor_pos(row, 0)?;
    lcd.print(fit(text, columns))
}

/// Draws one frame of the status screen and flushes it.
///
/// Expects the display in buffered mode with the bar glyphs loaded.
/// Rows beyond the panel height are skipped.
pub fn render<I2C: I2c, D: DelayNs>(
    lcd: &mut Lcd<I2C, D>,
    data: &SystemData,
) -> lcdstat_hw::Result<()> {
    let rows = lcd.geometry().rows();
    lcd.clear()?;

    let mem_free = 1.0 - data.mem_resident;
    bar_row(lcd, 0, &mem_label(mem_free * 100.0), mem_free)?;

    if rows > 1 {
        bar_row(lcd, 1, &cpu_label(data.cpu_usage * 100.0), data.cpu_usage)?;
    }
    if rows > 2 {
        let label = fs_label(data.fs_used_kb, data.fs_used * 100.0);
        bar_row(lcd, 2, &label, data.fs_used)?;
    }
    if rows > 3 {
        text_row(lcd, 3, &time_label(&data.time))?;
    }

    lcd.flush()
}
