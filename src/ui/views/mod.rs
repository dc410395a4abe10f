mod columns;
mod list;
mod orders;

pub use columns::TableRow;
pub use list::ListView;
pub use orders::OrdersView;
