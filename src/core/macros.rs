//! 核心宏定义

/// 为配置结构体实现 Default trait 的宏
///
/// 使用示例:
/// ```rust
/// use particle_backdrop::impl_default;
///
/// struct WindowSettings {
///     width: u32,
///     title: String,
/// }
///
/// impl_default!(WindowSettings {
///     width: 800,
///     title: "backdrop".to_string(),
/// });
///
/// assert_eq!(WindowSettings::default().width, 800);
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}
