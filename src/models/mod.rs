pub mod category;
pub mod department;
pub mod notification;
pub mod report;
pub mod user;

pub use category::{Entity as Category, Model as CategoryModel};
pub use department::{Entity as Department, Model as DepartmentModel};
pub use notification::{Entity as Notification, Model as NotificationModel, NotificationKind};
pub use report::{Entity as Report, Model as ReportModel, Priority, ReportStatus};
pub use user::{Entity as User, Model as UserModel, Role};
