mod connection_test;
mod cursor_test;
