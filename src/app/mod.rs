pub mod snippet_service;
