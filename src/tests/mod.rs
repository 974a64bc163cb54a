mod frame;
mod registers;
mod status;
