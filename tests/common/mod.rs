#![allow(dead_code)]

pub mod temp_files {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// Creates a temporary file with a unique name
    pub fn create_temp_file(content: &str, ext: &str) -> PathBuf {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();

        let path = std::env::temp_dir().join(format!(
            "aopweave_test_{}_{}_{}.{}",
            std::process::id(),
            counter,
            nanos,
            ext
        ));

        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn create_temp_yaml(content: &str) -> PathBuf {
        create_temp_file(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> PathBuf {
        create_temp_file(content, "json")
    }

    /// Cleanup temporary files (best effort)
    pub fn cleanup_temp_files(paths: &[PathBuf]) {
        for path in paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

pub mod fixtures {
    use aopweave::reflection::load_manifest;
    use aopweave::{ClassRegistry, Settings};
    use std::path::PathBuf;

    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    pub fn blog_classes() -> ClassRegistry {
        load_manifest(fixture_path("blog.yaml")).unwrap()
    }

    pub fn blog_settings() -> Settings {
        Settings::from_yaml_file(fixture_path("settings.yaml")).unwrap()
    }
}

pub mod recorder {
    use std::sync::{Arc, Mutex};

    /// Shared log that advice handlers and bodies append to
    #[derive(Clone, Default)]
    pub struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Recorder {
        pub fn record(&self, entry: impl Into<String>) {
            self.0.lock().unwrap().push(entry.into());
        }

        pub fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }
}
