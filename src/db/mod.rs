pub mod dbdoc;
