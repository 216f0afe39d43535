use chrono::{NaiveDate, NaiveDateTime};

use crate::config::{Config, ExportConfig, Labels};
use crate::error::{Error, ErrorKind, Result};
use crate::export::pdf::Document;
use crate::export::{
    self, page::PageFormat, raster, snapshot, Artifact, Capability, ExportBackend, ExportState,
    Platform, ShareOutcome,
};
use crate::grid::{build_grid, CalendarDayCell, DayKey};
use crate::month::DisplayedMonth;
use crate::notes::NoteStore;

/// State of one calendar session: the displayed month, the notes, and everything
/// needed to export them.
pub struct Session {
    month: DisplayedMonth,
    notes: NoteStore,
    now: NaiveDateTime,
    /// Cells of the live grid; `None` until the grid is mounted.
    grid: Option<Vec<CalendarDayCell>>,

    capability: Capability,
    export_state: ExportState,
    artifact: Option<Artifact>,
    /// Bumped whenever the printable content changes.
    revision: u64,

    export: ExportConfig,
    labels: Labels,
    platform: Platform,
}

impl Session {
    pub fn new(config: &Config, platform: Platform, now: NaiveDateTime) -> Self {
        Session {
            month: DisplayedMonth::from(now.date()),
            notes: NoteStore::new(),
            now,
            grid: None,
            capability: Capability::Unloaded,
            export_state: ExportState::Idle,
            artifact: None,
            revision: 0,
            export: config.export.clone(),
            labels: config.labels.clone(),
            platform,
        }
    }

    pub fn month(&self) -> DisplayedMonth {
        self.month
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn notes(&self) -> &NoteStore {
        &self.notes
    }

    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    pub fn export_state(&self) -> ExportState {
        self.export_state
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Cells of the live grid, if it is mounted.
    pub fn cells(&self) -> Option<&[CalendarDayCell]> {
        self.grid.as_deref()
    }

    /// Mounts the live grid for the displayed month.
    pub fn mount(&mut self) {
        self.grid = Some(build_grid(self.month, self.today()));
    }

    pub fn unmount(&mut self) {
        self.grid = None;
    }

    fn content_changed(&mut self) {
        self.revision += 1;
        if self.grid.is_some() {
            self.mount();
        }
    }

    pub fn go_to(&mut self, month: DisplayedMonth) {
        if month != self.month {
            log::debug!("Showing {}", month);
            self.month = month;
            self.content_changed();
        }
    }

    /// Moves `count` months ahead; the shown month stays when that leaves the supported range.
    pub fn next_month(&mut self, count: u32) -> Result<()> {
        let month = self.month.checked_add(count)?;
        self.go_to(month);
        Ok(())
    }

    pub fn prev_month(&mut self, count: u32) -> Result<()> {
        let month = self.month.checked_sub(count)?;
        self.go_to(month);
        Ok(())
    }

    pub fn go_to_today(&mut self) {
        self.go_to(DisplayedMonth::from(self.today()));
    }

    /// Advances the clock; crossing midnight moves the today highlight.
    pub fn tick(&mut self, now: NaiveDateTime) {
        let day_changed = now.date() != self.today();
        self.now = now;
        if day_changed {
            self.content_changed();
        }
    }

    fn editable_key(&self, date: NaiveDate) -> Result<DayKey> {
        if self.month.contains(&date) {
            Ok(DayKey::from(date))
        } else {
            Err(Error::new(
                ErrorKind::DayNotEditable,
                &format!("{} is not in {}", date, self.month),
            ))
        }
    }

    pub fn set_note(&mut self, date: NaiveDate, text: String) -> Result<()> {
        let key = self.editable_key(date)?;
        self.notes.set(key, text);
        self.revision += 1;
        Ok(())
    }

    pub fn append_note(&mut self, date: NaiveDate, line: &str) -> Result<()> {
        let key = self.editable_key(date)?;
        self.notes.append_line(key, line);
        self.revision += 1;
        Ok(())
    }

    pub fn note(&self, date: NaiveDate) -> &str {
        self.notes.text(&DayKey::from(date))
    }

    /// Whether quitting would lose notes.
    pub fn has_unsaved_notes(&self) -> bool {
        self.notes.has_content()
    }

    pub fn begin_loading(&mut self) {
        if matches!(self.capability, Capability::Unloaded) {
            self.capability = Capability::Loading;
        }
    }

    pub fn capability_loaded(&mut self, result: Result<ExportBackend>) {
        self.capability = match result {
            Ok(backend) => Capability::Ready(backend),
            Err(err) => Capability::LoadFailed(err.to_string()),
        };
    }

    fn artifact_is_fresh(&self) -> bool {
        self.artifact
            .as_ref()
            .map_or(false, |artifact| artifact.revision == self.revision)
    }

    /// Renders the displayed month into a new document, saving it right away if
    /// `persist` is set.
    pub fn generate_document(&mut self, persist: bool) -> Result<&Artifact> {
        if self.export_state == ExportState::Generating {
            return Err(Error::from(ErrorKind::GenerationInProgress));
        }
        let backend = self.capability.backend_mut()?;
        let cells = self
            .grid
            .as_deref()
            .ok_or_else(|| Error::from(ErrorKind::SourceMissing))?;

        self.export_state = ExportState::Generating;

        let layout = snapshot::build(
            self.month,
            cells,
            &self.notes,
            &self.labels,
            self.export.orientation,
        );
        let title = export::share_title(&self.labels, self.month);

        let document = match render(backend, layout, &self.export, &title) {
            Ok(document) => document,
            Err(err) => {
                log::error!("Generating the document failed: {}", err);
                self.export_state = ExportState::Failed;
                self.artifact = None;
                return Err(err);
            }
        };

        self.export_state = ExportState::Ready;
        let artifact = self.artifact.insert(Artifact {
            file_name: export::file_name(&self.export.file_prefix, self.month, self.now),
            pages: document.pages,
            bytes: document.bytes,
            revision: self.revision,
            downloaded: None,
        });

        if persist {
            let path = self
                .platform
                .downloader
                .save(&artifact.file_name, &artifact.bytes)?;
            artifact.downloaded = Some(path);
        }

        Ok(artifact)
    }

    /// Shares the current document, generating it first unless an up to date one
    /// exists. Without file sharing the document is saved instead, at most once.
    pub fn share(&mut self) -> Result<ShareOutcome> {
        if !self.artifact_is_fresh() {
            self.generate_document(false)?;
        }

        let artifact = self
            .artifact
            .as_mut()
            .ok_or_else(|| Error::from(ErrorKind::GenerationFailed))?;

        if self.platform.share.supports_files() {
            let title = export::share_title(&self.labels, self.month);
            let text = export::share_text(&self.labels, self.month);
            self.platform
                .share
                .share(&artifact.file_name, &artifact.bytes, &title, &text)?;
            log::info!("Shared {}", artifact.file_name);
            return Ok(ShareOutcome::Shared);
        }

        match &artifact.downloaded {
            Some(path) => Ok(ShareOutcome::Unsupported {
                path: path.clone(),
                downloaded_now: false,
            }),
            None => {
                let path = self
                    .platform
                    .downloader
                    .save(&artifact.file_name, &artifact.bytes)?;
                artifact.downloaded = Some(path.clone());
                Ok(ShareOutcome::Unsupported {
                    path,
                    downloaded_now: true,
                })
            }
        }
    }
}

/// Rasterizes `layout` on a mounted surface and assembles the document. The surface
/// is detached before this returns, whatever the outcome.
fn render(
    backend: &mut ExportBackend,
    layout: snapshot::SnapshotLayout,
    export: &ExportConfig,
    title: &str,
) -> Result<Document> {
    let image = {
        let mut mounted = raster::mount(backend.rasterizer.as_mut(), layout);
        mounted.rasterize(export.magnification)?
    };

    backend.writer.assemble(
        &image,
        PageFormat::a4(export.orientation),
        export.page_fill,
        export.fit,
        title,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::pdf::PrintPdfWriter;
    use crate::export::platform::{Downloader, ShareTarget};
    use crate::export::raster::{CanvasRasterizer, Rasterizer, SurfaceId};
    use image::RgbImage;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Log {
        attached: usize,
        detached: usize,
        downloads: Vec<String>,
        shares: Vec<(String, String, String)>,
    }

    type SharedLog = Arc<Mutex<Log>>;

    struct MockRasterizer {
        inner: CanvasRasterizer,
        fail: bool,
        log: SharedLog,
    }

    impl Rasterizer for MockRasterizer {
        fn attach(&mut self, layout: snapshot::SnapshotLayout) -> SurfaceId {
            self.log.lock().unwrap().attached += 1;
            self.inner.attach(layout)
        }

        fn rasterize(&mut self, surface: SurfaceId, _magnification: u32) -> Result<RgbImage> {
            if self.fail {
                return Err(Error::new(ErrorKind::GenerationFailed, "mock failure"));
            }
            self.inner.rasterize(surface, 1)
        }

        fn detach(&mut self, surface: SurfaceId) {
            self.log.lock().unwrap().detached += 1;
            self.inner.detach(surface)
        }

        fn attached(&self) -> usize {
            self.inner.attached()
        }
    }

    struct MockDownloader(SharedLog);

    impl Downloader for MockDownloader {
        fn save(&mut self, file_name: &str, _bytes: &[u8]) -> Result<PathBuf> {
            self.0.lock().unwrap().downloads.push(file_name.to_owned());
            Ok(PathBuf::from("/downloads").join(file_name))
        }
    }

    struct MockShare {
        supported: bool,
        fail: bool,
        log: SharedLog,
    }

    impl ShareTarget for MockShare {
        fn supports_files(&self) -> bool {
            self.supported
        }

        fn share(&mut self, file_name: &str, bytes: &[u8], title: &str, text: &str) -> Result<()> {
            assert!(bytes.starts_with(b"%PDF-"));
            if self.fail {
                return Err(Error::new(ErrorKind::ShareCancelledOrFailed, "dismissed"));
            }
            self.log.lock().unwrap().shares.push((
                file_name.to_owned(),
                title.to_owned(),
                text.to_owned(),
            ));
            Ok(())
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 14)
            .unwrap()
            .and_hms_opt(10, 30, 5)
            .unwrap()
    }

    fn session(share_supported: bool) -> (Session, SharedLog) {
        session_with_share(share_supported, false)
    }

    fn session_with_share(supported: bool, fail: bool) -> (Session, SharedLog) {
        let log = SharedLog::default();
        let platform = Platform::new(
            Box::new(MockDownloader(log.clone())),
            Box::new(MockShare {
                supported,
                fail,
                log: log.clone(),
            }),
        );
        (Session::new(&Config::default(), platform, now()), log)
    }

    fn backend(fail: bool, log: &SharedLog) -> ExportBackend {
        ExportBackend::new(
            Box::new(MockRasterizer {
                inner: CanvasRasterizer::new(),
                fail,
                log: log.clone(),
            }),
            Box::new(PrintPdfWriter::new()),
        )
    }

    fn ready_session(share_supported: bool) -> (Session, SharedLog) {
        let (mut session, log) = session(share_supported);
        session.begin_loading();
        session.capability_loaded(Ok(backend(false, &log)));
        session.mount();
        (session, log)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn generation_needs_capability() {
        let (mut session, log) = session(true);
        session.mount();
        session.begin_loading();

        let err = session.generate_document(true).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::CapabilityUnavailable));
        assert_eq!(session.export_state(), ExportState::Ready);
        assert!(session.artifact().is_none());
        assert!(log.lock().unwrap().downloads.is_empty());
        assert_eq!(session.month(), DisplayedMonth::new(2024, 1));
    }

    #[test]
    fn failed_capability_keeps_reason() {
        let (mut session, _log) = session(true);
        session.mount();
        session.capability_loaded(Err(Error::new(ErrorKind::InvalidConfig, "bad dir")));

        let err = session.generate_document(false).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::CapabilityUnavailable));
        assert!(err.to_string().contains("bad dir"));
    }

    #[test]
    fn generation_needs_mounted_grid() {
        let (mut session, log) = ready_session(true);
        session.unmount();

        let err = session.generate_document(false).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::SourceMissing));
        assert_eq!(log.lock().unwrap().attached, 0);
        assert_eq!(session.export_state(), ExportState::Ready);
    }

    #[test]
    fn second_request_while_generating_is_rejected() {
        let (mut session, _log) = ready_session(true);
        session.export_state = ExportState::Generating;

        let err = session.generate_document(false).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::GenerationInProgress));
    }

    #[test]
    fn failed_generation_detaches_and_caches_nothing() {
        let (mut session, log) = session(true);
        session.capability_loaded(Ok(backend(false, &log)));
        session.mount();
        session.generate_document(false).unwrap();
        assert!(session.artifact().is_some());

        session.capability_loaded(Ok(backend(true, &log)));
        let err = session.generate_document(true).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::GenerationFailed));
        assert_eq!(session.export_state(), ExportState::Failed);
        assert!(session.artifact().is_none());

        let log = log.lock().unwrap();
        assert_eq!(log.attached, 2);
        assert_eq!(log.detached, 2);
        assert!(log.downloads.is_empty());
    }

    #[test]
    fn generate_then_share_without_support_downloads_once() {
        let (mut session, log) = ready_session(false);

        session.generate_document(false).unwrap();
        assert!(log.lock().unwrap().downloads.is_empty());

        let outcome = session.share().unwrap();
        assert_eq!(
            outcome,
            ShareOutcome::Unsupported {
                path: PathBuf::from("/downloads/calendario-2024-02-14-05.pdf"),
                downloaded_now: true,
            }
        );

        match session.share().unwrap() {
            ShareOutcome::Unsupported { downloaded_now, .. } => assert!(!downloaded_now),
            outcome => panic!("unexpected outcome {:?}", outcome),
        }

        let log = log.lock().unwrap();
        assert_eq!(log.downloads, vec!["calendario-2024-02-14-05.pdf".to_owned()]);
        assert_eq!(log.attached, 1);
    }

    #[test]
    fn persisted_document_is_not_downloaded_again() {
        let (mut session, log) = ready_session(false);

        let artifact = session.generate_document(true).unwrap();
        assert!(artifact.downloaded.is_some());

        match session.share().unwrap() {
            ShareOutcome::Unsupported { downloaded_now, .. } => assert!(!downloaded_now),
            outcome => panic!("unexpected outcome {:?}", outcome),
        }
        assert_eq!(log.lock().unwrap().downloads.len(), 1);
    }

    #[test]
    fn share_reuses_fresh_artifact_only() {
        let (mut session, log) = ready_session(true);

        session.generate_document(false).unwrap();
        assert_eq!(session.share().unwrap(), ShareOutcome::Shared);
        assert_eq!(log.lock().unwrap().attached, 1);

        session.set_note(date(2024, 2, 14), "Hello".to_owned()).unwrap();
        assert_eq!(session.share().unwrap(), ShareOutcome::Shared);

        let log = log.lock().unwrap();
        assert_eq!(log.attached, 2);
        assert_eq!(log.shares.len(), 2);
        assert_eq!(log.shares[0].1, "Calendar - February 2024");
        assert_eq!(log.shares[0].2, "My February 2024 calendar with notes.");
        assert!(log.downloads.is_empty());
    }

    #[test]
    fn failed_share_keeps_artifact_and_saves_nothing() {
        let (mut session, log) = session_with_share(true, true);
        session.begin_loading();
        session.capability_loaded(Ok(backend(false, &log)));
        session.mount();

        let bytes = session.generate_document(false).unwrap().bytes.clone();
        let err = session.share().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ShareCancelledOrFailed));

        let artifact = session.artifact().unwrap();
        assert_eq!(artifact.bytes, bytes);
        assert!(artifact.downloaded.is_none());
        assert_eq!(session.export_state(), ExportState::Ready);

        // a retry reuses the cached document
        assert!(session.share().is_err());
        let log = log.lock().unwrap();
        assert_eq!(log.attached, 1);
        assert!(log.shares.is_empty());
        assert!(log.downloads.is_empty());
    }

    #[test]
    fn navigation_past_the_supported_range_keeps_the_month() {
        let (mut session, _log) = ready_session(true);
        let start = session.month();
        let cells = session.cells().unwrap().to_vec();

        for count in [i32::MAX as u32, 4_000_000, u32::MAX] {
            let err = session.next_month(count).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::DateParse));
            assert!(session.prev_month(count).is_err());
        }
        assert_eq!(session.month(), start);
        assert_eq!(session.cells().unwrap(), &cells[..]);

        session.go_to(DisplayedMonth::latest());
        assert!(session.next_month(1).is_err());
        assert_eq!(session.month(), DisplayedMonth::latest());
        assert_eq!(session.cells().unwrap().len() % 7, 0);
        session.prev_month(1).unwrap();

        session.go_to(DisplayedMonth::earliest());
        assert!(session.prev_month(1).is_err());
        assert_eq!(
            chrono::Datelike::weekday(&session.cells().unwrap()[0].date),
            chrono::Weekday::Sun
        );
    }

    #[test]
    fn generating_twice_gives_two_documents() {
        let (mut session, _log) = ready_session(true);
        session
            .set_note(date(2024, 2, 14), "Hello\nWorld".to_owned())
            .unwrap();

        let first = session.generate_document(false).unwrap().clone();
        let second = session.generate_document(false).unwrap().clone();

        for doc in [&first, &second] {
            assert_eq!(doc.pages, 1);
            assert!(doc.bytes.starts_with(b"%PDF-"));
        }
        assert_eq!(session.export_state(), ExportState::Ready);
    }

    #[test]
    fn filler_days_are_not_editable() {
        let (mut session, _log) = ready_session(true);

        let err = session.set_note(date(2024, 1, 31), "x".to_owned()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DayNotEditable));
        let err = session.append_note(date(2024, 3, 1), "x").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DayNotEditable));
        assert!(!session.has_unsaved_notes());

        session.append_note(date(2024, 2, 1), "one").unwrap();
        session.append_note(date(2024, 2, 1), "two").unwrap();
        assert_eq!(session.note(date(2024, 2, 1)), "one\ntwo");
        assert!(session.has_unsaved_notes());

        session.set_note(date(2024, 2, 1), "  ".to_owned()).unwrap();
        assert!(!session.has_unsaved_notes());
    }

    #[test]
    fn notes_survive_navigation() {
        let (mut session, _log) = ready_session(true);
        let start = session.month();
        session.set_note(date(2024, 2, 29), "leap".to_owned()).unwrap();

        session.next_month(1).unwrap();
        assert_eq!(session.month(), DisplayedMonth::new(2024, 2));
        assert!(session.cells().unwrap().iter().any(|c| c.date == date(2024, 3, 31)));
        session.prev_month(1).unwrap();
        assert_eq!(session.month(), start);

        session.prev_month(13).unwrap();
        assert_eq!(session.month(), DisplayedMonth::new(2023, 0));
        session.go_to_today();
        assert_eq!(session.month(), start);

        assert_eq!(session.note(date(2024, 2, 29)), "leap");
    }

    #[test]
    fn midnight_moves_today() {
        let (mut session, _log) = ready_session(true);
        let is_today = |s: &Session, d| {
            s.cells()
                .unwrap()
                .iter()
                .find(|c| c.is_today)
                .map(|c| c.date)
                == Some(d)
        };
        assert!(is_today(&session, date(2024, 2, 14)));

        session.tick(date(2024, 2, 15).and_hms_opt(0, 0, 1).unwrap());
        assert!(is_today(&session, date(2024, 2, 15)));
        assert_eq!(session.today(), date(2024, 2, 15));
    }
}
