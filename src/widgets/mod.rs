pub mod positioned_list;
