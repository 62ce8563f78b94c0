//! CSV report of an evaluation run.
//!
//! Layout, one record per line with `\n` terminators:
//!
//! ```text
//! Class Number,Class Name,IoU
//! 1,road,97.1
//! ...
//! mIoU,75.3,
//! Validation loss,0.21,
//! FPS,48.2,
//! ```
//!
//! The third field of the summary rows is a single space. Undefined values are
//! written as `nan`.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use csv::{Terminator, WriterBuilder};

use crate::{classes::ClassNames, error::SegEvalResult, evaluation::EvaluationResult};

const HEADER: [&str; 3] = ["Class Number", "Class Name", "IoU"];

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "nan".to_string(), |v| v.to_string())
}

/// Write the report for `result` to `writer`.
pub fn write_report<W: Write>(
    writer: W,
    result: &EvaluationResult,
    class_names: &ClassNames,
) -> SegEvalResult<()> {
    let mut csv = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(HEADER)?;
    for (class_id, iou) in result.scores.iter() {
        csv.write_record([
            class_id.to_string(),
            class_names.get(class_id)?.to_string(),
            format_value(iou),
        ])?;
    }
    csv.write_record(["mIoU".to_string(), format_value(result.mean_iou()), " ".to_string()])?;
    csv.write_record([
        "Validation loss".to_string(),
        result.mean_loss.to_string(),
        " ".to_string(),
    ])?;
    csv.write_record(["FPS".to_string(), result.fps.to_string(), " ".to_string()])?;

    csv.flush()?;
    Ok(())
}

/// Path of the report for `model_name` inside `result_dir`.
pub fn report_path(result_dir: &Path, model_name: &str) -> PathBuf {
    result_dir.join(format!("{model_name}.csv"))
}

/// Write `<result_dir>/<model_name>.csv`, creating `result_dir` if needed.
pub fn save_report(
    result_dir: &Path,
    model_name: &str,
    result: &EvaluationResult,
    class_names: &ClassNames,
) -> SegEvalResult<PathBuf> {
    fs::create_dir_all(result_dir)?;
    let path = report_path(result_dir, model_name);
    write_report(fs::File::create(&path)?, result, class_names)?;

    tracing::info!(path = %path.display(), "saved evaluation result");
    Ok(path)
}
