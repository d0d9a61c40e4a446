//! Sort the source directory into visa and personal directories.

use crate::error::Result;
use crate::layout::{self, Layout, Relocation, Side};
use crate::report::{ClassifyEntry, ClassifyReport};
use visamatch_core::{Classification, Classifier, FaceDetect};

/// Classify every `.jpg` in `layout.source` and move it to the directory of
/// its verdict. Unknown images stay where they are.
pub fn classify_directory<D: FaceDetect>(classifier: &mut Classifier<D>, layout: &Layout) -> Result<ClassifyReport> {
    layout.ensure()?;
    let files = layout::scan_jpgs(&layout.source)?;
    tracing::info!(source = %layout.source.display(), files = files.len(), "classification started");

    let mut report = ClassifyReport::default();

    for path in files {
        let filename = layout::file_name(&path);
        let classification = classifier.classify_path(&path);

        let side = match &classification {
            Classification::Visa(_) => Some(Side::Visa),
            Classification::Personal(_) => Some(Side::Personal),
            Classification::Unknown(reason) => {
                tracing::warn!(file = %filename, %reason, "skipped");
                None
            }
        };

        let destination = match side {
            Some(side) => {
                if let Some(r) = classification.ratios() {
                    tracing::info!(file = %filename, area = r.size, y_ratio = r.y, verdict = %side, "classified");
                }
                Some(layout::relocate(&path, layout.classified(side), &filename, Relocation::Move)?)
            }
            None => None,
        };

        report.entries.push(ClassifyEntry {
            filename,
            classification,
            destination,
        });
    }

    Ok(report)
}
