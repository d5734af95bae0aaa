//! 运行结果的文字摘要.

use std::io::{self, Write};

use ct_speck::SpeckReport;

const SEP: &str = "--------------------------------------------------------";

/// 将 `report` 的摘要写进 `w` 中.
pub fn describe_into<W: Write>(report: &SpeckReport, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    let located = &report.located;
    let analysis = &report.analysis;
    let search = &analysis.search;

    writeln!(w, "{SEP}")?;
    writeln!(w, "Location:")?;
    writeln!(w, "{S4}Rotated by 180 degrees: {}", located.flipped)?;
    writeln!(w, "{S4}Region: {:?}", located.region.as_tuple())?;
    writeln!(w, "{S4}Edges: x = {}, y = {}", located.edges.x, located.edges.y)?;
    writeln!(w, "{S4}Marker group: {:?}", located.group.as_tuple())?;
    writeln!(w, "Focal slice #{} (max {})", analysis.focal.number, analysis.focal.max)?;
    writeln!(
        w,
        "{S4}Threshold: {} ({}) after {} attempts, output {}",
        search.threshold,
        if search.used_default_threshold() {
            "default"
        } else {
            "adjusted"
        },
        search.iterations,
        search.shape
    )?;
    writeln!(w, "Landmarks:")?;
    for (pos, p) in analysis.landmarks.iter() {
        writeln!(w, "{S4}{:>6}: {}", pos.label(), p)?;
    }
    writeln!(w, "{S4}{:>6}: {}", "bg", analysis.landmarks.background())?;

    if let Some(row) = analysis.table.focal_row() {
        writeln!(
            w,
            "Focal row: mean of maxima {:.3}, background {:.3}",
            row.mean_of_maxima, row.background_mean
        )?;
    }
    writeln!(w, "{SEP}")?;
    Ok(())
}
