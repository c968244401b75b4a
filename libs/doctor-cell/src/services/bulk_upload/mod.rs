//! Bulk doctor-availability upload.
//!
//! An uploaded `.xlsx` passes through three stages: the extension/size
//! [`gate`], the row [`validator`] (which rejects the whole batch if any row
//! is invalid) and the [`committer`] (which writes nothing unless every
//! referenced doctor exists).

pub mod committer;
pub mod error;
pub mod gate;
pub mod validator;
pub mod workbook;

use tracing::{info, warn};

pub use committer::{DoctorDirectory, SlotCommitter, SlotStore};
pub use error::BulkUploadError;
pub use gate::{check_upload, UploadedFile, ALLOWED_EXTENSIONS};
pub use validator::{
    validate_grid, validate_rows, validate_upload, RawRow, RowError, ValidatedRecord,
    ValidationOutcome, REQUIRED_HEADERS,
};
pub use workbook::{read_first_sheet, CellValue, SheetGrid};

/// Runs the whole pipeline for one upload and returns the number of slots created.
pub async fn process_upload<D, S>(
    file: &UploadedFile,
    max_bytes: usize,
    directory: &D,
    store: &S,
) -> Result<usize, BulkUploadError>
where
    D: DoctorDirectory + ?Sized,
    S: SlotStore + ?Sized,
{
    check_upload(&file.file_name, file.size(), max_bytes)?;

    let records = match validate_upload(&file.bytes)? {
        ValidationOutcome::Valid(records) => records,
        ValidationOutcome::Invalid(row_errors) => {
            warn!("{}: {} invalid row(s)", file.file_name, row_errors.len());
            return Err(BulkUploadError::RowValidationFailed(row_errors));
        }
    };

    let unresolved = SlotCommitter::new(directory, store).commit(&records).await?;
    if !unresolved.is_empty() {
        return Err(BulkUploadError::UnresolvedReference(unresolved));
    }

    info!("{}: created {} availability slots", file.file_name, records.len());
    Ok(records.len())
}
