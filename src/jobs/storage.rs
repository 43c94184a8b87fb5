//! # Persistencia de Resultados
//! src/jobs/storage.rs
//!
//! Un archivo JSON por job terminado, nombrado por su id. La presencia del
//! archivo es la señal de "job terminado" que consultan los clientes.
//!
//! La escritura es atómica: el contenido se escribe completo en un archivo
//! temporal y después se renombra, así un lector concurrente nunca ve un
//! archivo a medio escribir.

use crate::error::StoreError;
use crate::jobs::types::{JobId, JobResult};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Resultado de leer un job del store
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(JobResult),

    /// No hay resultado (job pendiente, en ejecución o desconocido)
    NotFound,

    /// Hay algo guardado pero no se puede interpretar
    Corrupt(String),
}

/// Interfaz del Result Store
///
/// Permite cambiar el backend de archivos por uno en memoria sin tocar el
/// Worker Pool.
pub trait ResultStore: Send + Sync {
    /// Guarda el resultado terminal de un job
    fn put(&self, id: JobId, result: &JobResult) -> Result<(), StoreError>;

    /// Lee el resultado de un job
    fn get(&self, id: JobId) -> Lookup;

    /// El job llegó a estado terminal (resultado presente y no vacío)
    fn exists(&self, id: JobId) -> bool;

    /// Ids de todos los resultados guardados, en orden ascendente
    fn list(&self) -> Result<Vec<JobId>, StoreError>;

    /// Borra todos los resultados; retorna cuántos se borraron
    fn clear(&self) -> Result<usize, StoreError>;
}

/// Store basado en un directorio: `<dir>/job_id_<N>.json`
#[derive(Debug, Clone)]
pub struct FileResultStore {
    dir: PathBuf,
}

impl FileResultStore {
    /// Abre el store, creando el directorio si no existe
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Directory {
            path: dir.display().to_string(),
            source,
        })?;

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: JobId) -> PathBuf {
        self.dir.join(id.file_name())
    }

    /// Archivo temporal oculto junto al definitivo (mismo filesystem,
    /// para que el rename sea atómico)
    fn temp_path_for(&self, id: JobId) -> PathBuf {
        self.dir.join(format!(".{}.tmp", id.file_name()))
    }

    fn write_atomic(&self, id: JobId, bytes: &[u8]) -> io::Result<()> {
        let temp_path = self.temp_path_for(id);

        let written = (|| -> io::Result<()> {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(bytes)?;
            writer.flush()?;
            writer.get_ref().sync_all()
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        // Renombrar (atómico en sistemas Unix)
        fs::rename(&temp_path, self.path_for(id)).inspect_err(|_| {
            let _ = fs::remove_file(&temp_path);
        })
    }

    fn dir_error(&self, source: io::Error) -> StoreError {
        StoreError::Directory {
            path: self.dir.display().to_string(),
            source,
        }
    }
}

impl ResultStore for FileResultStore {
    fn put(&self, id: JobId, result: &JobResult) -> Result<(), StoreError> {
        // Serializar completo en memoria antes de tocar el disco
        let bytes = serde_json::to_vec(&result.to_json()).map_err(|source| StoreError::Serialize {
            job_id: id.to_string(),
            source,
        })?;

        self.write_atomic(id, &bytes).map_err(|source| StoreError::Io {
            job_id: id.to_string(),
            source,
        })
    }

    fn get(&self, id: JobId) -> Lookup {
        let bytes = match fs::read(self.path_for(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Lookup::NotFound,
            Err(e) => return Lookup::Corrupt(format!("unreadable result file: {}", e)),
        };

        if bytes.is_empty() {
            return Lookup::Corrupt("empty result file".to_string());
        }

        match serde_json::from_slice(&bytes) {
            Ok(value) => Lookup::Found(JobResult::from_json(value)),
            Err(e) => Lookup::Corrupt(format!("unparsable result file: {}", e)),
        }
    }

    fn exists(&self, id: JobId) -> bool {
        fs::metadata(self.path_for(id))
            .map(|meta| meta.is_file() && meta.len() > 0)
            .unwrap_or(false)
    }

    fn list(&self) -> Result<Vec<JobId>, StoreError> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.dir).map_err(|e| self.dir_error(e))? {
            let entry = entry.map_err(|e| self.dir_error(e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };

            // Ignora temporales (".job_id_N.json.tmp") y archivos ajenos
            if let Some(id) = name.strip_suffix(".json").and_then(|stem| stem.parse::<JobId>().ok()) {
                ids.push(id);
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let ids = self.list()?;

        for id in &ids {
            fs::remove_file(self.path_for(*id)).map_err(|source| StoreError::Io {
                job_id: id.to_string(),
                source,
            })?;
        }

        Ok(ids.len())
    }
}

/// Store en memoria, para pruebas o para embeber el motor sin disco
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    results: Mutex<HashMap<JobId, JobResult>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, JobResult>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultStore for MemoryResultStore {
    fn put(&self, id: JobId, result: &JobResult) -> Result<(), StoreError> {
        self.lock().insert(id, result.clone());
        Ok(())
    }

    fn get(&self, id: JobId) -> Lookup {
        match self.lock().get(&id) {
            Some(result) => Lookup::Found(result.clone()),
            None => Lookup::NotFound,
        }
    }

    fn exists(&self, id: JobId) -> bool {
        self.lock().contains_key(&id)
    }

    fn list(&self) -> Result<Vec<JobId>, StoreError> {
        let mut ids: Vec<JobId> = self.lock().keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let mut results = self.lock();
        let removed = results.len();
        results.clear();
        Ok(removed)
    }
}
