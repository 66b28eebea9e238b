use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, LitInt, Pat};

/// Time a simulation system when the `perf_stats` feature is enabled.
///
/// The body is wrapped in a drop guard that logs `[PERF] <name>` through
/// bevy's `info!` once the call exceeds the threshold (default 1ms). If the
/// system takes a `tick: Res<SimTick>` parameter the guard also reports on
/// every 200th tick so steady-state cost shows up in the log.
///
/// Without the feature the attribute expands to the original function.
///
/// ```ignore
/// #[profile(2)]
/// pub fn update_combatants(tick: Res<SimTick>, mut pool: ResMut<EntityPool>) { .. }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        let lit = parse_macro_input!(attr as LitInt);
        match lit.base10_parse() {
            Ok(v) => v,
            Err(e) => return e.to_compile_error().into(),
        }
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let has_tick_param = sig.inputs.iter().any(|arg| {
        let FnArg::Typed(pat_type) = arg else {
            return false;
        };
        let Pat::Ident(pat_ident) = &*pat_type.pat else {
            return false;
        };
        let ty = &pat_type.ty;
        pat_ident.ident == "tick" && quote!(#ty).to_string().contains("SimTick")
    });

    let tick_expr = if has_tick_param {
        quote! { Some(tick.0) }
    } else {
        quote! { None }
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_guard = {
                struct ProfileGuard {
                    name: &'static str,
                    start: std::time::Instant,
                    tick: Option<u64>,
                }
                impl Drop for ProfileGuard {
                    fn drop(&mut self) {
                        let elapsed = self.start.elapsed();
                        let periodic = self.tick.map_or(false, |t| t % 200 == 0);
                        if elapsed.as_millis() > #threshold_ms || periodic {
                            match self.tick {
                                Some(t) => bevy::prelude::info!("[PERF] {} @tick {}: {:?}", self.name, t, elapsed),
                                None => bevy::prelude::info!("[PERF] {}: {:?}", self.name, elapsed),
                            }
                        }
                    }
                }
                ProfileGuard {
                    name: #fn_name_str,
                    start: std::time::Instant::now(),
                    tick: #tick_expr,
                }
            };

            #block
        }
    };

    output.into()
}
