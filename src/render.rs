use std::fmt::Write as _;

use rust_decimal::Decimal;

use crate::analytics::levels::focus_window;
use crate::model::{AssetMetrics, GammaProfile};

fn join_levels(levels: &[Decimal]) -> String {
    levels
        .iter()
        .map(|l| l.normalize().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn pine_array(levels: &[Decimal]) -> String {
    if levels.is_empty() {
        "array.new_float(0)".to_string()
    } else {
        format!("array.from({})", join_levels(levels))
    }
}

/// TradingView indicator drawing the walls, the flip and the ranked levels
/// as fixed horizontal lines.
pub fn pine_script(metrics: &AssetMetrics) -> String {
    let flip = metrics
        .flip_price
        .map(|p| format!("{p}"))
        .unwrap_or_else(|| "na".to_string());

    let mut script = String::new();
    script.push_str(
        "// This Pine Script® code is subject to the terms of the Mozilla Public License 2.0 \
         at https://mozilla.org/MPL/2.0/\n\n",
    );
    script.push_str("//@version=6\n");
    script.push_str("indicator('GEX Levels', overlay=true)\n\n");
    let _ = writeln!(script, "call_wall = {}", metrics.call_wall_strike.value().normalize());
    let _ = writeln!(script, "put_wall  = {}", metrics.put_wall_strike.value().normalize());
    let _ = writeln!(script, "flip_point = {flip}");
    let _ = writeln!(script, "top_calls = {}", pine_array(&metrics.top_calls));
    let _ = writeln!(script, "top_puts  = {}\n", pine_array(&metrics.top_puts));
    script.push_str("// Call Wall and Put Wall (static lines with hline)\n");
    script.push_str(
        "hline(call_wall, 'Call Wall', color=color.blue, linewidth=2, linestyle=hline.style_solid)\n",
    );
    script.push_str(
        "hline(put_wall, 'Put Wall', color=color.red, linewidth=2, linestyle=hline.style_solid)\n",
    );
    script.push_str(
        "hline(flip_point, 'Flip Point', color=color.rgb(251, 218, 0), linewidth=2, \
         linestyle=hline.style_solid)\n\n",
    );
    script.push_str("// Function to draw horizontal dynamic lines\n");
    script.push_str("f_draw_levels(levels_array, col) =>\n");
    script.push_str("  for i = 0 to array.size(levels_array) - 1\n");
    script.push_str("    level = array.get(levels_array, i)\n");
    script.push_str(
        "    line.new(bar_index[100], level, bar_index, level, extend=extend.both, \
         style=line.style_dashed, color=col, width=1)\n",
    );
    script.push_str(
        "    label.new(bar_index, level, str.tostring(i + 1), style=label.style_label_left, \
         textcolor=color.white, color=col)\n\n",
    );
    script.push_str("// Draw top calls (dark blue)\n");
    script.push_str("f_draw_levels(top_calls, color.rgb(62, 34, 186))\n\n");
    script.push_str("// Draw top puts (blood red)\n");
    script.push_str("f_draw_levels(top_puts, color.rgb(161, 17, 94))\n");
    script
}

/// Print the per-asset summary followed by the strike table of the focus
/// window.
pub fn print_summary(metrics: &AssetMetrics, window: usize) {
    println!("\n{}", "═".repeat(72));
    println!("  GEX Levels: {}", metrics.asset_id.to_uppercase());
    println!("{}", "═".repeat(72));
    println!("  {:<18} {:>14}", "Last price", metrics.last_price);
    println!("  {:<18} {:>14}", "Call wall", metrics.call_wall_strike);
    println!("  {:<18} {:>14}", "Put wall", metrics.put_wall_strike);
    match metrics.flip_price {
        Some(p) => println!("  {:<18} {:>14.2}", "Gamma flip", p),
        None => println!("  {:<18} {:>14}", "Gamma flip", "-"),
    }
    println!("  {:<18} {:>14}", "Top calls", join_levels(&metrics.top_calls));
    println!("  {:<18} {:>14}", "Top puts", join_levels(&metrics.top_puts));
    println!("  {}", "-".repeat(68));
    println!(
        "  {:>12} {:>16} {:>16} {:>16}",
        "Strike", "Call GEX", "Put GEX", "Total GEX"
    );
    for gex in focus_window(&metrics.strikes, metrics.last_price, window) {
        let marker = if gex.strike == metrics.call_wall_strike {
            " ◀ call wall"
        } else if gex.strike == metrics.put_wall_strike {
            " ◀ put wall"
        } else {
            ""
        };
        println!(
            "  {:>12} {:>+16.0} {:>+16.0} {:>+16.0}{}",
            gex.strike.to_string(),
            gex.call_gex,
            gex.put_gex,
            gex.total_gex,
            marker
        );
    }
    println!("{}", "═".repeat(72));
}

/// Print the gamma sweep behind a flip estimate.
pub fn print_profile(asset_id: &str, profile: &GammaProfile) {
    println!("\n  Gamma profile: {} (scaled)", asset_id.to_uppercase());
    println!(
        "  {:>12} {:>14} {:>14} {:>14}",
        "Spot", "Total", "Ex next exp", "Ex monthly"
    );
    let rows = profile
        .levels
        .iter()
        .zip(&profile.total)
        .zip(&profile.ex_next_expiry)
        .zip(&profile.ex_next_monthly);
    for (((spot, total), ex_next), ex_monthly) in rows {
        println!("  {spot:>12.2} {total:>+14.4} {ex_next:>+14.4} {ex_monthly:>+14.4}");
    }
}
