use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use uuid::Uuid;

use localize_core::catalog::{self, po, CatalogEntry, TRANSLATION_ID_HEADER};
use localize_core::host::{ContentHost, Document, DocumentHost};
use localize_core::model::{Locale, TranslationId};
use localize_core::services::assemble::{self, AssembleOptions};
use localize_core::services::memory::{self, TranslationStatus};
use localize_core::services::submit::{self, SubmitRequest};
use localize_core::services::{sources, translations};
use localize_core::store::Store;
use localize_core::LocalizeError;

fn en() -> Locale {
    Locale::parse("en").unwrap()
}

fn fr() -> Locale {
    Locale::parse("fr").unwrap()
}

struct World {
    store: Store,
    host: DocumentHost,
    doc: Document,
}

impl World {
    fn new(doc: Document) -> Self {
        let mut host = DocumentHost::default();
        host.put(doc.clone());
        Self {
            store: Store::in_memory(),
            host,
            doc,
        }
    }

    fn submit(&mut self) -> submit::SubmitReport {
        let request = SubmitRequest {
            include_related: false,
            ..SubmitRequest::new(vec![fr()])
        };
        submit::submit_for_translation(&self.store, &mut self.host, &self.doc, &request).unwrap()
    }

    fn translation(&self) -> (TranslationId, Uuid) {
        self.store.read(|db| {
            let t = db.translations.iter().next().unwrap();
            (t.id, t.uuid)
        })
    }

    fn memory_rows(&self) -> Vec<(String, String)> {
        self.store.read(|db| {
            db.string_translations
                .iter()
                .map(|t| (t.locale.to_string(), t.data.clone()))
                .collect()
        })
    }
}

fn hello_page() -> Document {
    Document::new("page", Uuid::new_v4(), en()).with_field("title", json!("Hello"))
}

#[test]
fn hello_becomes_bonjour() {
    let mut w = World::new(hello_page());

    let report = w.submit();
    let s1 = report.root().unwrap().source_id;
    assert!(report.root().unwrap().created);
    assert_eq!(w.store.read(|db| db.segments.len()), 1);

    let (tid, uuid) = w.translation();
    let exported = w
        .store
        .read(|db| catalog::export_source_catalog(db, s1, Some(uuid)))
        .unwrap();
    assert_eq!(exported.entries.len(), 1);
    assert_eq!(exported.entries[0].msgid, "Hello");
    assert_eq!(exported.entries[0].msgstr, "");

    let progress = w.store.read(|db| translations::progress(db, translations::require(db, tid).unwrap()));
    assert_eq!((progress.total, progress.translated), (1, 0));

    let mut filled = exported.clone();
    filled.entries[0].msgstr = "Bonjour".into();
    let text = po::render(&filled);
    let imported = catalog::import_file(&w.store, &mut w.host, text.as_bytes(), false).unwrap();
    assert_eq!(imported.report.created, 1);
    assert!(imported.saved);
    assert_eq!(w.memory_rows(), vec![("fr".to_string(), "Bonjour".to_string())]);

    let progress = w.store.read(|db| translations::progress(db, translations::require(db, tid).unwrap()));
    assert_eq!((progress.total, progress.translated), (1, 1));
    assert_eq!(progress.status(), TranslationStatus::UpToDate);

    let out = assemble::create_or_update_localized_object(
        &w.store,
        &mut w.host,
        s1,
        &fr(),
        AssembleOptions::default(),
    )
    .unwrap();
    assert_eq!(out.instance.fields["title"], json!("Bonjour"));
    assert_eq!(
        w.host.get(&w.doc.key(), &fr()).unwrap().fields["title"],
        json!("Bonjour")
    );

    let (again, created) = w
        .store
        .transaction(|db| sources::from_instance(db, &w.host, &w.doc, false))
        .unwrap();
    assert!(!created);
    assert_eq!(again.id, s1);
}

#[test]
fn exported_translation_catalog_reimports_as_a_no_op() {
    let doc = hello_page()
        .with_field("intro", json!("World"))
        .with_field("footer", json!("Hello"));
    let mut w = World::new(doc);
    w.submit();
    let (tid, _) = w.translation();

    let mut catalog = w
        .store
        .read(|db| catalog::export_translation_catalog(db, tid))
        .unwrap();
    for entry in &mut catalog.entries {
        entry.msgstr = format!("[fr] {}", entry.msgid);
    }
    catalog::import_file(&w.store, &mut w.host, po::render(&catalog).as_bytes(), true).unwrap();
    let before = w.memory_rows();
    assert_eq!(before.len(), 3);

    let exported = w
        .store
        .read(|db| catalog::export_translation_catalog(db, tid))
        .unwrap();
    let report = catalog::import_file(&w.store, &mut w.host, po::render(&exported).as_bytes(), true)
        .unwrap()
        .report;
    assert_eq!(report.unchanged, 3);
    assert!(!report.changed());
    assert_eq!(w.memory_rows(), before);
}

#[test]
fn obsolete_entries_survive_a_source_change() {
    let mut w = World::new(hello_page());
    w.submit();
    let (tid, _) = w.translation();

    let mut catalog = w
        .store
        .read(|db| catalog::export_translation_catalog(db, tid))
        .unwrap();
    catalog.entries[0].msgstr = "Bonjour".into();
    catalog::import_file(&w.store, &mut w.host, po::render(&catalog).as_bytes(), false).unwrap();

    w.doc.fields.insert("title".into(), json!("Hello there"));
    w.host.put(w.doc.clone());
    w.submit();

    let exported = w
        .store
        .read(|db| catalog::export_translation_catalog(db, tid))
        .unwrap();
    let rendered = po::render(&exported);
    assert!(rendered.contains("#~ msgid \"Hello\""));
    assert!(rendered.contains("#~ msgstr \"Bonjour\""));

    // Re-importing keeps the remembered translation even in delete mode.
    let report = catalog::import_file(&w.store, &mut w.host, rendered.as_bytes(), true)
        .unwrap()
        .report;
    assert_eq!(report.deleted, 0);
    assert_eq!(w.memory_rows(), vec![("fr".to_string(), "Bonjour".to_string())]);
}

#[test]
fn resubmission_follows_a_grown_source() {
    let doc = hello_page()
        .with_field("body", json!(["One"]))
        .with_field("count", json!(1));
    let mut w = World::new(doc);
    w.submit();
    assert_eq!(
        w.host.get(&w.doc.key(), &fr()).unwrap().fields["body"],
        json!(["One"])
    );

    w.doc.fields.insert("body".into(), json!(["One", "Two"]));
    w.doc.fields.insert("count".into(), json!(2));
    w.doc.fields.remove("title");
    w.host.put(w.doc.clone());
    let report = w.submit();
    assert!(report.root().unwrap().created);
    assert!(report.deferred.is_empty());

    let localized = w.host.get(&w.doc.key(), &fr()).unwrap();
    assert_eq!(localized.fields["body"], json!(["One", "Two"]));
    assert_eq!(localized.fields["count"], json!(2));
    assert!(!localized.fields.contains_key("title"));
    assert_eq!(w.store.read(|db| db.sources.len()), 2);
}

#[test]
fn unknown_string_is_reported_and_not_recorded() {
    let mut w = World::new(hello_page());
    w.submit();
    let (_, uuid) = w.translation();

    let mut catalog = catalog::Catalog::default();
    catalog
        .metadata
        .insert(TRANSLATION_ID_HEADER.into(), uuid.to_string());
    catalog.entries.push(CatalogEntry::new(
        format!("{}:title", w.doc.translation_key),
        "Never extracted",
        "Jamais",
    ));

    let out = catalog::import_file(&w.store, &mut w.host, po::render(&catalog).as_bytes(), false)
        .unwrap();
    assert_eq!(out.report.warnings.len(), 1);
    assert_eq!(
        out.report.warnings[0].to_string(),
        "entry 0: unknown string \"Never extracted\""
    );
    assert!(!out.saved);
    assert!(w.memory_rows().is_empty());
}

#[test]
fn import_without_translation_id_is_rejected() {
    let mut w = World::new(hello_page());
    w.submit();

    let text = "msgid \"\"\nmsgstr \"\"\n\"MIME-Version: 1.0\\n\"\n\nmsgid \"Hello\"\nmsgstr \"Bonjour\"\n";
    let err = catalog::import_file(&w.store, &mut w.host, text.as_bytes(), false).unwrap_err();
    assert!(matches!(
        err,
        LocalizeError::Catalog(localize_core::error::CatalogError::MissingTranslationId)
    ));
    assert!(w.memory_rows().is_empty());
}

#[test]
fn missing_translation_leaves_no_trace() {
    let doc = hello_page().with_field("intro", json!("World"));
    let mut w = World::new(doc);
    let s1 = w.submit().root().unwrap().source_id;
    let logs_before = w.store.read(|db| db.logs.len());
    let fr_copy_before = w.host.get(&w.doc.key(), &fr()).cloned();

    let (_, uuid) = w.translation();
    let mut catalog = catalog::Catalog::default();
    catalog
        .metadata
        .insert(TRANSLATION_ID_HEADER.into(), uuid.to_string());
    catalog.entries.push(CatalogEntry::new(
        format!("{}:title", w.doc.translation_key),
        "Hello",
        "Bonjour",
    ));
    catalog::import_file(&w.store, &mut w.host, po::render(&catalog).as_bytes(), false).unwrap();
    let fr_copy_after_import = w.host.get(&w.doc.key(), &fr()).cloned();
    let logs_after_import = w.store.read(|db| db.logs.len());

    let err = assemble::create_or_update_localized_object(
        &w.store,
        &mut w.host,
        s1,
        &fr(),
        AssembleOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LocalizeError::MissingTranslation { .. }));
    assert_eq!(w.store.read(|db| db.logs.len()), logs_after_import);
    assert_eq!(w.host.get(&w.doc.key(), &fr()).cloned(), fr_copy_after_import);
    assert!(logs_after_import > logs_before);
    assert!(fr_copy_before.is_some());
}

#[test]
fn progress_counts_leaf_strings_only() {
    let doc = hello_page()
        .with_field("rule", json!({"$template": {"format": "html", "template": "<hr>", "string_count": 0}}))
        .with_field("intro", json!("World"));
    let mut w = World::new(doc);
    let s1 = w.submit().root().unwrap().source_id;

    let p = w.store.read(|db| memory::progress(db, s1, &fr()));
    assert_eq!((p.total, p.translated), (2, 0));
    assert_eq!(p.status().to_string(), "Waiting for translations");
}

#[test]
fn file_backed_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("localize.json");
    let docs_path = dir.path().join("documents.json");
    let doc = hello_page();

    {
        let store = Store::open(&store_path).unwrap();
        let mut host = DocumentHost::load(&docs_path).unwrap();
        host.put(doc.clone());
        submit::submit_for_translation(&store, &mut host, &doc, &SubmitRequest::new(vec![fr()]))
            .unwrap();
    }

    let store = Store::open(&store_path).unwrap();
    let host = DocumentHost::load(&docs_path).unwrap();
    assert_eq!(store.read(|db| (db.sources.len(), db.translations.len())), (1, 1));
    assert!(host.has_instance(&doc.key(), &fr()));
}

#[test]
fn line_protocol_round_trip() {
    use localize_core::protocol::{handle, Session};

    let mut session = Session::in_memory();
    let mut call = |cmd: &str, payload: Value| -> Value {
        let line = json!({ "id": cmd, "cmd": cmd, "payload": payload }).to_string();
        let res: Value = serde_json::from_str(&handle(&mut session, &line)).unwrap();
        assert_eq!(res["status"], "ok", "{cmd}: {res}");
        res["payload"].clone()
    };

    let key = Uuid::new_v4().to_string();
    call(
        "document.put",
        json!({ "document": {
            "content_type": "page",
            "translation_key": key,
            "locale": "en",
            "fields": { "title": "Hello" }
        }}),
    );
    let report = call(
        "submit",
        json!({ "content_type": "page", "translation_key": key, "locale": "en", "target_locales": ["fr"] }),
    );
    let tid = report["translations"][0].as_u64().unwrap();

    let exported = call("translation.export_po", json!({ "translation_id": tid }));
    let po_text = exported["po"]
        .as_str()
        .unwrap()
        .replace("msgid \"Hello\"\nmsgstr \"\"", "msgid \"Hello\"\nmsgstr \"Bonjour\"");
    let imported = call("translation.import_po", json!({ "po": po_text }));
    assert_eq!(imported["report"]["created"], 1);
    assert_eq!(imported["saved"], true);

    let progress = call("translation.progress", json!({ "translation_id": tid }));
    assert_eq!(progress["status"], "Up to date");

    let doc = call(
        "document.get",
        json!({ "content_type": "page", "translation_key": key, "locale": "fr" }),
    );
    assert_eq!(doc["document"]["fields"]["title"], "Bonjour");

    let list = call("translation.list", json!({ "content_type": "page", "translation_key": key }));
    assert_eq!(list["translations"].as_array().unwrap().len(), 1);
}
