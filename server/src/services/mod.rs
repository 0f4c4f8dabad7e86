pub mod dataset_loader;
