//! 模块描述与句柄
//!
//! 此模块包含仿真模块的编排器侧表示：标识、设备绑定、
//! 步进能力 trait、客户端提交的 ModuleSpec 以及运行期句柄。

// 子模块声明
mod device;
mod handle;
mod id;
mod spec;
mod step;

// 重新导出公共接口
pub use device::Device;
pub use handle::{ModuleHandle, ModuleState};
pub use id::ModuleId;
pub use spec::ModuleSpec;
pub use step::{LaunchInfo, ModuleError, StepModule};
