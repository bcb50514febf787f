//! JSON-lines request handling. One request per line:
//! `{"id": .., "cmd": "..", "payload": {..}}`, answered with
//! `{"id": .., "status": "ok", "payload": {..}}` or
//! `{"id": .., "status": "error", "message": ".."}`.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use crate::catalog::{self, po};
use crate::config::Args;
use crate::error::StoreError;
use crate::host::{ContentHost, Document, DocumentHost};
use crate::model::{Locale, ObjectKey, SourceId, Translation, TranslationId};
use crate::services::submit::{self, SubmitRequest};
use crate::services::{assemble, encoding, objects, translations};
use crate::store::{Database, Store};

mod command;
use command::Command;

/// State shared by every request of one process.
pub struct Session {
    store: Store,
    host: DocumentHost,
}

impl Session {
    pub fn open(args: &Args) -> Result<Self, StoreError> {
        if args.in_memory {
            return Ok(Self::in_memory());
        }

        Ok(Self {
            store: Store::open(args.store_path())?,
            host: DocumentHost::load(&args.documents_path())?,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            store: Store::in_memory(),
            host: DocumentHost::default(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn host(&self) -> &DocumentHost {
        &self.host
    }
}

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

fn get_str<'a>(payload: &'a Value, key: &str) -> Result<&'a str, String> {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("payload.{key} is required"))
}

fn get_bool(payload: &Value, key: &str, default: bool) -> bool {
    payload.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

fn get_u64(payload: &Value, key: &str) -> Result<u64, String> {
    payload
        .get(key)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| format!("payload.{key} must be a number"))
}

fn get_uuid(payload: &Value, key: &str) -> Result<Uuid, String> {
    let raw = get_str(payload, key)?;
    Uuid::try_parse(raw).map_err(|e| format!("invalid payload.{key}: {e}"))
}

fn get_locale(payload: &Value, key: &str) -> Result<Locale, String> {
    Locale::parse(get_str(payload, key)?).map_err(|e| e.to_string())
}

fn get_key(payload: &Value) -> Result<ObjectKey, String> {
    Ok(ObjectKey::new(
        get_str(payload, "content_type")?,
        get_uuid(payload, "translation_key")?,
    ))
}

fn to_value<T: Serialize>(value: T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

fn describe(db: &Database, t: &Translation) -> Value {
    let progress = translations::progress(db, t);
    json!({
        "id": t.id,
        "uuid": t.uuid,
        "target_locale": t.target_locale,
        "source_id": t.source_id,
        "enabled": t.enabled,
        "total": progress.total,
        "translated": progress.translated,
        "status": progress.status().to_string(),
        "source_last_updated_at": t.source_last_updated_at,
        "translations_last_updated_at": t.translations_last_updated_at,
        "destination_last_updated_at": t.destination_last_updated_at,
    })
}

pub fn handle(session: &mut Session, input: &str) -> String {
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => {
            return json!({
                "status": "error",
                "message": "invalid json"
            })
            .to_string();
        }
    };

    let id = get_id(&req);
    let cmd_str = get_cmd(&req);
    let payload = get_payload(&req);
    let cmd = Command::from(cmd_str);
    debug!(cmd = cmd_str, "request");

    match dispatch(session, cmd, payload) {
        Ok(value) => ok(id, value),
        Err(message) => err(id, message),
    }
}

fn dispatch(session: &mut Session, cmd: Command, payload: &Value) -> Result<Value, String> {
    match cmd {
        Command::Ping => Ok(json!({ "message": "localize-core alive" })),

        Command::DetectEncoding => {
            let path = PathBuf::from(get_str(payload, "path")?);
            let bytes = std::fs::read(&path).map_err(|e| e.to_string())?;
            to_value(encoding::detect(&bytes))
        }

        Command::DocumentPut => {
            let raw = payload
                .get("document")
                .cloned()
                .ok_or("payload.document is required")?;
            let doc: Document =
                serde_json::from_value(raw).map_err(|e| format!("invalid payload.document: {e}"))?;
            let out = json!({
                "content_type": doc.content_type,
                "translation_key": doc.translation_key,
                "locale": doc.locale,
            });
            let previous = session.host.clone();
            session.host.put(doc);
            if let Err(e) = session.host.persist() {
                error!(error = %e, "failed to persist documents");
                session.host = previous;
                return Err(e.to_string());
            }
            Ok(out)
        }

        Command::DocumentGet => {
            let key = get_key(payload)?;
            let locale = get_locale(payload, "locale")?;
            Ok(json!({ "document": session.host.get(&key, &locale) }))
        }

        Command::Submit => {
            let key = get_key(payload)?;
            let locale = get_locale(payload, "locale")?;
            let instance = session
                .host
                .get_instance(&key, &locale)
                .ok_or_else(|| format!("no {locale} document {}", key.translation_key))?;

            let mut target_locales = Vec::new();
            for v in payload
                .get("target_locales")
                .and_then(|v| v.as_array())
                .ok_or("payload.target_locales must be an array")?
            {
                let code = v.as_str().ok_or("target locales must be strings")?;
                target_locales.push(Locale::parse(code).map_err(|e| e.to_string())?);
            }

            let request = SubmitRequest {
                target_locales,
                force: get_bool(payload, "force", false),
                include_related: get_bool(payload, "include_related", true),
            };
            let report =
                submit::submit_for_translation(&session.store, &mut session.host, &instance, &request)
                    .map_err(|e| e.to_string())?;
            to_value(report)
        }

        Command::SourceExportPo => {
            let source_id = SourceId(get_u64(payload, "source_id")?);
            let request_id = match payload.get("request_id") {
                Some(_) => Some(get_uuid(payload, "request_id")?),
                None => None,
            };
            let catalog = session
                .store
                .read(|db| catalog::export_source_catalog(db, source_id, request_id))
                .map_err(|e| e.to_string())?;
            Ok(json!({ "po": po::render(&catalog) }))
        }

        Command::TranslationExportPo => {
            let id = TranslationId(get_u64(payload, "translation_id")?);
            let catalog = session
                .store
                .read(|db| catalog::export_translation_catalog(db, id))
                .map_err(|e| e.to_string())?;
            Ok(json!({ "po": po::render(&catalog) }))
        }

        Command::TranslationImportPo => {
            let bytes = match payload.get("po").and_then(|v| v.as_str()) {
                Some(text) => text.as_bytes().to_vec(),
                None => std::fs::read(get_str(payload, "path")?).map_err(|e| e.to_string())?,
            };
            let delete_unseen = get_bool(payload, "delete_unseen", false);
            let out = catalog::import_file(&session.store, &mut session.host, &bytes, delete_unseen)
                .map_err(|e| e.to_string())?;
            to_value(out)
        }

        Command::TranslationProgress => {
            let id = TranslationId(get_u64(payload, "translation_id")?);
            session.store.read(|db| {
                let t = translations::require(db, id).map_err(|e| e.to_string())?;
                Ok(describe(db, t))
            })
        }

        Command::TranslationList => {
            let key = get_key(payload)?;
            session.store.read(|db| {
                let object = objects::find_object(db, &key)
                    .ok_or_else(|| format!("{} is not registered for translation", key.translation_key))?;
                let list: Vec<Value> = translations::for_object(db, object.id)
                    .into_iter()
                    .map(|t| describe(db, t))
                    .collect();
                Ok(json!({ "translations": list }))
            })
        }

        Command::TranslationSaveTarget => {
            let id = TranslationId(get_u64(payload, "translation_id")?);
            let publish = get_bool(payload, "publish", true);
            let out = assemble::save_target(&session.store, &mut session.host, id, publish)
                .map_err(|e| e.to_string())?;
            Ok(json!({
                "created": out.created,
                "revision": out.revision,
                "document": out.instance,
            }))
        }

        Command::Unknown => Err("unknown command".to_string()),
    }
}
