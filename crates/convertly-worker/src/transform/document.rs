//! Document-family transformations: merge, split, convert.
//!
//! Merge and split operate on PDFs via `lopdf`; format conversion
//! shells out to an office converter CLI with a timeout. All staging
//! happens in a job-scoped temporary directory or in memory.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use tokio::process::Command;
use tracing::{debug, info};

use convertly_core::error::{AppError, ErrorKind};
use convertly_core::result::AppResult;
use convertly_core::traits::ObjectStore;
use convertly_entity::{DocumentPayload, Job, JobOutput, JobPayload};

use super::{key_extension, output_key, Transformer};

/// Transformer for the document family.
#[derive(Debug)]
pub struct DocumentTransformer {
    store: Arc<dyn ObjectStore>,
    office_command: String,
    convert_timeout: Duration,
}

impl DocumentTransformer {
    /// Create a document transformer over the given object store.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        office_command: impl Into<String>,
        convert_timeout: Duration,
    ) -> Self {
        Self {
            store,
            office_command: office_command.into(),
            convert_timeout,
        }
    }

    async fn merge(&self, job: &Job, keys: &[String]) -> AppResult<JobOutput> {
        let mut documents = Vec::with_capacity(keys.len());
        for key in keys {
            let data = self.store.download(key).await?;
            let doc = load_pdf(key, &data)?;
            documents.push(doc);
        }

        let mut merged = merge_documents(documents)?;

        let mut buffer = Vec::new();
        merged.save_to(&mut buffer).map_err(|e| {
            AppError::with_source(ErrorKind::Transformation, "failed to write merged PDF", e)
        })?;

        let out_key = output_key(job.id, "merged", "pdf");
        let size = buffer.len() as u64;
        self.store.upload(&out_key, buffer.into()).await?;

        info!(job_id = %job.id, inputs = keys.len(), key = %out_key, "Merged PDFs");
        Ok(JobOutput::document(out_key, size))
    }

    async fn split(
        &self,
        job: &Job,
        key: &str,
        start_page: u32,
        end_page: u32,
    ) -> AppResult<JobOutput> {
        let data = self.store.download(key).await?;
        let mut doc = load_pdf(key, &data)?;

        let total = doc.get_pages().len() as u32;
        if start_page > total {
            return Err(AppError::validation(format!(
                "start_page {start_page} is beyond the document's {total} pages"
            )));
        }

        // Clamp the requested range to what the document actually has.
        let start = start_page.max(1);
        let end = end_page.min(total);
        debug!(job_id = %job.id, start, end, total, "Extracting page range");

        let removed: Vec<u32> = (1..=total).filter(|p| *p < start || *p > end).collect();
        if !removed.is_empty() {
            doc.delete_pages(&removed);
        }
        doc.prune_objects();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).map_err(|e| {
            AppError::with_source(ErrorKind::Transformation, "failed to write split PDF", e)
        })?;

        let out_key = output_key(job.id, "split", "pdf");
        let size = buffer.len() as u64;
        self.store.upload(&out_key, buffer.into()).await?;

        info!(job_id = %job.id, pages = end - start + 1, key = %out_key, "Split PDF");
        Ok(JobOutput::document(out_key, size))
    }

    async fn convert(&self, job: &Job, key: &str, target_format: &str) -> AppResult<JobOutput> {
        let data = self.store.download(key).await?;

        let workdir = tempfile::tempdir()?;
        let ext = key_extension(key).unwrap_or("bin");
        let input_path = workdir.path().join(format!("input.{ext}"));
        tokio::fs::write(&input_path, &data).await?;

        info!(
            job_id = %job.id,
            command = %self.office_command,
            target_format,
            "Starting office conversion"
        );

        let mut cmd = Command::new(&self.office_command);
        cmd.arg("--headless")
            .arg("--convert-to")
            .arg(target_format)
            .arg("--outdir")
            .arg(workdir.path())
            .arg(&input_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.convert_timeout, cmd.output())
            .await
            .map_err(|_| {
                AppError::transformation(format!(
                    "office conversion timed out after {}s",
                    self.convert_timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Transformation,
                    format!("failed to launch office converter '{}'", self.office_command),
                    e,
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::transformation(format!(
                "office conversion exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.chars().take(2000).collect::<String>()
            )));
        }

        let produced = workdir.path().join(format!("input.{target_format}"));
        let meta = tokio::fs::metadata(&produced).await.map_err(|_| {
            AppError::transformation(format!(
                "office converter produced no {target_format} output"
            ))
        })?;

        let out_key = output_key(job.id, "converted", target_format);
        self.store.upload_file(&out_key, &produced).await?;

        info!(job_id = %job.id, key = %out_key, size = meta.len(), "Converted document");
        Ok(JobOutput::document(out_key, meta.len()))
    }
}

#[async_trait]
impl Transformer for DocumentTransformer {
    async fn apply(&self, job: &Job) -> AppResult<JobOutput> {
        let JobPayload::Document(payload) = job.typed_payload()? else {
            return Err(AppError::internal(format!(
                "job {} routed to the document pool with family {}",
                job.id, job.family
            )));
        };

        match payload {
            DocumentPayload::Merge { keys } => self.merge(job, &keys).await,
            DocumentPayload::Split {
                key,
                start_page,
                end_page,
            } => self.split(job, &key, start_page, end_page).await,
            DocumentPayload::Convert { key, target_format } => {
                self.convert(job, &key, &target_format).await
            }
        }
    }
}

fn load_pdf(key: &str, data: &[u8]) -> AppResult<Document> {
    Document::load_mem(data)
        .map_err(|e| pdf_error(format!("failed to parse PDF '{key}'"), e))
}

fn pdf_error(message: impl Into<String>, source: lopdf::Error) -> AppError {
    AppError::with_source(ErrorKind::Transformation, message.into(), source)
}

/// Name of a dictionary object's `/Type`, if it has one.
fn object_type(object: &Object) -> Option<Vec<u8>> {
    let name = object.as_dict().ok()?.get(b"Type").ok()?.as_name().ok()?;
    Some(name.to_vec())
}

/// Concatenate the pages of several PDFs into one document.
///
/// Objects from every input are renumbered into one id space; page
/// objects are re-parented under a single page tree and the first
/// catalog wins. Outlines are dropped.
fn merge_documents(documents: Vec<Document>) -> AppResult<Document> {
    let mut max_id = 1;
    let mut page_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut all_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, object_id) in doc.get_pages() {
            let object = doc
                .get_object(object_id)
                .map_err(|e| pdf_error("input PDF has a broken page tree", e))?
                .to_owned();
            page_objects.insert(object_id, object);
        }
        all_objects.extend(doc.objects);
    }

    if page_objects.is_empty() {
        return Err(AppError::transformation("no pages found in input PDFs"));
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog_id: Option<ObjectId> = None;
    let mut pages_id: Option<ObjectId> = None;
    let mut pages_dict = Dictionary::new();

    for (object_id, object) in all_objects {
        match object_type(&object).as_deref() {
            Some(b"Catalog") => {
                catalog_id.get_or_insert(object_id);
            }
            Some(b"Pages") => {
                if let Ok(dict) = object.as_dict() {
                    pages_dict.extend(dict);
                }
                pages_id.get_or_insert(object_id);
            }
            // Pages are re-inserted below with a fixed parent; outlines
            // from the inputs would dangle, so they are dropped.
            Some(b"Page") | Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let pages_id =
        pages_id.ok_or_else(|| AppError::transformation("no page tree found in input PDFs"))?;
    let catalog_id =
        catalog_id.ok_or_else(|| AppError::transformation("no catalog found in input PDFs"))?;

    for (object_id, object) in &page_objects {
        if let Ok(dict) = object.as_dict() {
            let mut dict = dict.clone();
            dict.set("Parent", pages_id);
            merged.objects.insert(*object_id, Object::Dictionary(dict));
        }
    }

    pages_dict.set("Count", page_objects.len() as u32);
    pages_dict.set(
        "Kids",
        page_objects
            .keys()
            .map(|id| Object::Reference(*id))
            .collect::<Vec<_>>(),
    );
    merged
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    merged.objects.insert(
        catalog_id,
        Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        }),
    );

    merged.trailer.set("Root", catalog_id);
    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.compress();

    Ok(merged)
}
