use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;
use once_cell::sync::OnceCell;

use super::metrics::FontMetrics;
use super::resources::{FontResources, CODE_MAPPING_LEN};
use crate::error::{FolioError, FolioResult};

type Cache<T> = RwLock<HashMap<String, Arc<OnceCell<Arc<T>>>>>;

/// The code that identity mappings map to a line feed.
const LINE_FEED_CID: usize = 0xFF00;

/// A shared cache over [`FontResources`].
///
/// Loading a code mapping or parsing a metric record is comparatively
/// expensive, so each of them happens at most once per registry, no matter
/// how many documents use the font. The registry can be shared between
/// threads with an [`Arc`].
pub struct FontRegistry {
    resources: Box<dyn FontResources>,
    mappings: Cache<Vec<u16>>,
    cid_mappings: Cache<Vec<u16>>,
    encodings: Cache<Vec<u16>>,
    metrics: Cache<FontMetrics>,
}

impl fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontRegistry").finish_non_exhaustive()
    }
}

impl FontRegistry {
    /// Create a new registry over `resources`.
    pub fn new(resources: impl FontResources + 'static) -> Self {
        Self {
            resources: Box::new(resources),
            mappings: Cache::default(),
            cid_mappings: Cache::default(),
            encodings: Cache::default(),
            metrics: Cache::default(),
        }
    }

    /// Whether `font` (without style suffix) supports `encoding`.
    pub fn is_cjk_font(&self, font: &str, encoding: &str) -> bool {
        let Some(encodings) = self.resources.font_encodings(font) else {
            return false;
        };

        encoding == "Identity-H"
            || encoding == "Identity-V"
            || encodings.contains(&format!("_{encoding}_"))
    }

    /// The CID to Unicode mapping of `font`, used by the identity encodings.
    pub fn cid_to_unicode(&self, font: &str) -> FolioResult<Arc<Vec<u16>>> {
        let entry = self
            .resources
            .font_encodings(font)
            .ok_or_else(|| missing(font))?;
        let name = entry.split('_').next().unwrap_or_default().to_string();

        cached(&self.cid_mappings, &name, || {
            let mut mapping = self.raw_mapping(&name)?.to_vec();
            mapping[LINE_FEED_CID] = u16::from(b'\n');
            Ok(mapping)
        })
    }

    /// The Unicode to CID mapping of a non-identity `encoding`.
    pub fn encoding_table(&self, encoding: &str) -> FolioResult<Arc<Vec<u16>>> {
        cached(&self.encodings, encoding, || {
            let entry = self
                .resources
                .encoding_mapping(encoding)
                .ok_or_else(|| missing(encoding))?;
            let mut names = entry.split_whitespace();
            let base = self.raw_mapping(names.next().ok_or_else(|| missing(encoding))?)?;

            match names.next() {
                Some(overlay) => {
                    let mut merged = self.raw_mapping(overlay)?.to_vec();
                    for (code, cid) in merged.iter_mut().enumerate() {
                        if *cid == 0 {
                            *cid = base[code];
                        }
                    }
                    Ok(merged)
                }
                None => Ok(base.to_vec()),
            }
        })
    }

    /// The parsed metric record of `font`.
    pub fn metrics(&self, font: &str) -> FolioResult<Arc<FontMetrics>> {
        cached(&self.metrics, font, || {
            let record = self
                .resources
                .font_record(font)
                .ok_or_else(|| missing(font))?;
            debug!("parsing metric record of {font}");

            FontMetrics::parse(font, &record)
        })
    }

    fn raw_mapping(&self, name: &str) -> FolioResult<Arc<Vec<u16>>> {
        cached(&self.mappings, name, || {
            debug!("loading code mapping {name}");

            let mut mapping = self.resources.load_code_mapping(name).map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    missing(name)
                } else {
                    FolioError::Io(e)
                }
            })?;
            mapping.resize(CODE_MAPPING_LEN, 0);

            Ok(mapping)
        })
    }
}

fn missing(name: &str) -> FolioError {
    FolioError::MissingEncodingResource {
        name: name.to_string(),
    }
}

fn cached<T>(
    cache: &Cache<T>,
    key: &str,
    init: impl FnOnce() -> FolioResult<T>,
) -> FolioResult<Arc<T>> {
    let existing = cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
        .cloned();

    let cell = match existing {
        Some(cell) => cell,
        None => cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_default()
            .clone(),
    };

    cell.get_or_try_init(|| init().map(Arc::new)).cloned()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::font::metrics::tests::record;
    use crate::font::resources::InMemoryResources;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A registry with `HeiseiMin-W3`, supporting `UniJIS-UCS2-H` and
    /// the identity encodings.
    pub(crate) fn registry() -> FontRegistry {
        FontRegistry::new(resources())
    }

    pub(crate) fn resources() -> InMemoryResources {
        let mut cid_to_unicode = vec![0; 0x10000];
        // CID 1 is a space, 231 is 'A', 2 is '!'.
        cid_to_unicode[1] = 0x20;
        cid_to_unicode[2] = 0x21;
        cid_to_unicode[231] = 0x41;

        let mut unicode_to_cid = vec![0; 0x10000];
        unicode_to_cid[0x20] = 1;
        unicode_to_cid[0x21] = 2;
        unicode_to_cid[0x41] = 231;

        let mut overlay = vec![0; 0x10000];
        overlay[0x41] = 232;

        let mut resources = InMemoryResources::new();
        resources
            .add_font("HeiseiMin-W3", "UniJIS-UCS2-_UniJIS-UCS2-H_UniJIS-UCS2-V_UniJIS-UCS2-HW-H_")
            .add_encoding("UniJIS-UCS2-H", "UniJIS-UCS2-H")
            .add_encoding("UniJIS-UCS2-V", "UniJIS-UCS2-H")
            .add_encoding("UniJIS-UCS2-HW-H", "UniJIS-UCS2-H UniJIS-UCS2-HW-H")
            .add_font_record("HeiseiMin-W3", record(&[]))
            .add_code_mapping("UniJIS-UCS2-", cid_to_unicode)
            .add_code_mapping("UniJIS-UCS2-H", unicode_to_cid)
            .add_code_mapping("UniJIS-UCS2-HW-H", overlay);

        resources
    }

    #[derive(Debug)]
    struct Counting {
        inner: InMemoryResources,
        loads: Arc<AtomicUsize>,
    }

    impl FontResources for Counting {
        fn font_encodings(&self, font: &str) -> Option<String> {
            self.inner.font_encodings(font)
        }

        fn encoding_mapping(&self, encoding: &str) -> Option<String> {
            self.inner.encoding_mapping(encoding)
        }

        fn font_record(&self, font: &str) -> Option<BTreeMap<String, String>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.font_record(font)
        }

        fn load_code_mapping(&self, name: &str) -> io::Result<Vec<u16>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load_code_mapping(name)
        }
    }

    #[test]
    fn cjk_font_check() {
        let registry = registry();

        assert!(registry.is_cjk_font("HeiseiMin-W3", "UniJIS-UCS2-H"));
        assert!(registry.is_cjk_font("HeiseiMin-W3", "Identity-V"));
        assert!(!registry.is_cjk_font("HeiseiMin-W3", "UniGB-UCS2-H"));
        assert!(!registry.is_cjk_font("STSong-Light", "Identity-H"));
    }

    #[test]
    fn identity_mapping_maps_line_feed() {
        let mapping = registry().cid_to_unicode("HeiseiMin-W3").unwrap();

        assert_eq!(mapping[231], 0x41);
        assert_eq!(mapping[0xFF00], 0x0A);
    }

    #[test]
    fn overlay_wins_where_present() {
        let table = registry().encoding_table("UniJIS-UCS2-HW-H").unwrap();

        assert_eq!(table[0x41], 232);
        assert_eq!(table[0x20], 1);
    }

    #[test]
    fn missing_encoding() {
        assert!(matches!(
            registry().encoding_table("UniKS-UCS2-H"),
            Err(FolioError::MissingEncodingResource { ref name }) if name == "UniKS-UCS2-H"
        ));
    }

    #[test]
    fn missing_mapping_file() {
        let mut resources = resources();
        resources.add_encoding("UniCNS-UCS2-H", "UniCNS-UCS2-H");
        let registry = FontRegistry::new(resources);

        assert!(matches!(
            registry.encoding_table("UniCNS-UCS2-H"),
            Err(FolioError::MissingEncodingResource { ref name }) if name == "UniCNS-UCS2-H"
        ));
    }

    #[test]
    fn resources_are_loaded_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let registry = FontRegistry::new(Counting {
            inner: resources(),
            loads: loads.clone(),
        });

        for _ in 0..3 {
            registry.metrics("HeiseiMin-W3").unwrap();
            registry.encoding_table("UniJIS-UCS2-H").unwrap();
            registry.encoding_table("UniJIS-UCS2-V").unwrap();
        }

        // One metric record and one code mapping, shared by both encodings.
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn shared_between_threads() {
        let registry = Arc::new(registry());

        let handles = (0..4)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.metrics("HeiseiMin-W3").map(|m| m.ascent))
            })
            .collect::<Vec<_>>();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), 880);
        }
    }
}
