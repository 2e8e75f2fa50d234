pub mod csv_dir;
