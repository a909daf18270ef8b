// src/dataset.rs

use crate::error::{Error, Result};
use crate::model::Dimensions;
use crate::store::InteractionStore;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const TEST_IMG_DIR: &str = "test_img";
pub const IMGS_DIR: &str = "imgs";
pub const INTERACTIONS_FILE: &str = "interactions.json";

/// Location of the persisted interactions for a dataset folder
pub fn interactions_path(folder: &Path) -> PathBuf {
    folder.join(TEST_IMG_DIR).join(INTERACTIONS_FILE)
}

/// One recorded interaction sequence: the screenshots of a single test
#[derive(Debug, Clone)]
pub struct Dataset {
    pub test_id: String,
    /// Image paths sorted lexically
    pub images: Vec<PathBuf>,
    /// Size of the first image, if it could be read
    pub dimensions: Option<Dimensions>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Basename of the image at `index`, which is its key in the store
    pub fn image_id(&self, index: usize) -> Option<String> {
        self.images.get(index).and_then(|path| image_id_of(path))
    }

    pub fn image_ids(&self) -> Vec<String> {
        self.images.iter().filter_map(|p| image_id_of(p)).collect()
    }

    pub fn index_of(&self, image_id: &str) -> Option<usize> {
        self.images
            .iter()
            .position(|p| image_id_of(p).as_deref() == Some(image_id))
    }
}

fn image_id_of(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// A loaded dataset folder: its datasets plus the annotations found for them
#[derive(Debug)]
pub struct Workspace {
    pub root: PathBuf,
    pub datasets: BTreeMap<String, Dataset>,
    pub store: InteractionStore,
}

impl Workspace {
    pub fn dataset(&self, test_id: &str) -> Result<&Dataset> {
        self.datasets
            .get(test_id)
            .ok_or_else(|| Error::UnknownTestId(test_id.to_string()))
    }

    /// The dataset shown first: lexically smallest test id
    pub fn first_dataset(&self) -> Option<&Dataset> {
        self.datasets.values().next()
    }

    pub fn interactions_path(&self) -> PathBuf {
        interactions_path(&self.root)
    }

    /// Persists the store next to the datasets and returns where it went
    pub fn save(&self) -> Result<PathBuf> {
        let path = self.interactions_path();
        self.store.save(&path)?;
        info!("Interactions exported to {}", path.display());
        Ok(path)
    }
}

/// Scans `<folder>/test_img/<test_id>/imgs/` for datasets and loads
/// `<folder>/test_img/interactions.json`.
///
/// Subfolders without an `imgs` directory, or with an empty one, are ignored.
pub fn discover(folder: &Path) -> Result<Workspace> {
    let test_img = folder.join(TEST_IMG_DIR);
    if !test_img.is_dir() {
        return Err(Error::MissingTestImg(folder.to_path_buf()));
    }

    let store = InteractionStore::load_file(&interactions_path(folder));

    let mut subfolders = Vec::new();
    for entry in fs::read_dir(&test_img).map_err(Error::io(&test_img))? {
        let entry = entry.map_err(Error::io(&test_img))?;
        if entry.path().is_dir() {
            subfolders.push(entry.path());
        }
    }
    if subfolders.is_empty() {
        return Err(Error::NoTestFolders(folder.to_path_buf()));
    }

    let mut groups = Vec::new();
    for subfolder in subfolders {
        let imgs = subfolder.join(IMGS_DIR);
        if !imgs.is_dir() {
            continue;
        }
        let images = list_images(&imgs)?;
        if images.is_empty() {
            continue;
        }
        if let Some(test_id) = image_id_of(&subfolder) {
            groups.push((test_id, images));
        }
    }
    if groups.is_empty() {
        return Err(Error::NoImageFolders(folder.to_path_buf()));
    }

    let datasets: BTreeMap<String, Dataset> = groups
        .into_par_iter()
        .map(|(test_id, images)| {
            let dimensions = read_dimensions(&images[0]);
            let dataset = Dataset {
                test_id: test_id.clone(),
                images,
                dimensions,
            };
            (test_id, dataset)
        })
        .collect();

    info!(
        "Loaded {} datasets and {} interactions from {}",
        datasets.len(),
        store.len(),
        folder.display()
    );

    Ok(Workspace {
        root: folder.to_path_buf(),
        datasets,
        store,
    })
}

/// Non-hidden entries of an `imgs` folder, sorted
fn list_images(imgs: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(imgs).map_err(Error::io(imgs))? {
        let entry = entry.map_err(Error::io(imgs))?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        images.push(entry.path());
    }
    images.sort();
    Ok(images)
}

fn read_dimensions(path: &Path) -> Option<Dimensions> {
    match image::image_dimensions(path) {
        Ok((width, height)) => {
            debug!("{}: {}x{}", path.display(), width, height);
            Some(Dimensions::new(width, height))
        }
        Err(e) => {
            warn!("Could not read image size of {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn write_image(path: &Path, width: u32, height: u32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn discovers_datasets_and_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_image(&root.join("test_img/checkout/imgs/02.png"), 40, 20);
        write_image(&root.join("test_img/checkout/imgs/01.png"), 40, 20);
        fs::write(root.join("test_img/checkout/imgs/.DS_Store"), b"junk").unwrap();
        write_image(&root.join("test_img/browse/imgs/a.png"), 8, 8);
        fs::create_dir_all(root.join("test_img/notes")).unwrap();

        let workspace = discover(root).unwrap();
        assert_eq!(
            workspace.datasets.keys().collect::<Vec<_>>(),
            vec!["browse", "checkout"]
        );

        let checkout = workspace.dataset("checkout").unwrap();
        assert_eq!(checkout.image_ids(), vec!["01.png", "02.png"]);
        assert_eq!(checkout.dimensions, Some(Dimensions::new(40, 20)));
        assert_eq!(checkout.index_of("02.png"), Some(1));
        assert!(workspace.store.is_empty());
        assert_eq!(workspace.first_dataset().unwrap().test_id, "browse");
    }

    #[test]
    fn missing_test_img_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(discover(dir.path()), Err(Error::MissingTestImg(_))));
    }

    #[test]
    fn test_img_without_image_folders_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("test_img")).unwrap();
        assert!(matches!(discover(dir.path()), Err(Error::NoTestFolders(_))));

        fs::create_dir_all(dir.path().join("test_img/t1/imgs")).unwrap();
        assert!(matches!(discover(dir.path()), Err(Error::NoImageFolders(_))));
    }

    #[test]
    fn unknown_test_id_lookup_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_image(&dir.path().join("test_img/t/imgs/1.png"), 4, 4);
        let workspace = discover(dir.path()).unwrap();
        assert!(matches!(
            workspace.dataset("nope"),
            Err(Error::UnknownTestId(_))
        ));
    }
}
