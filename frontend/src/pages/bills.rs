use wasm_bindgen_futures::spawn_local;
use web_sys::{File, FormData};
use yew::prelude::*;

use crate::api::{self, BillsResponse, StoredBill, UploadResponse, UploadedBill};
use crate::format::format_currency;
use crate::toast::ToastHandle;
use crate::validate::allowed_bill_file;
use crate::{icon_upload, page_shell};

#[function_component(BillUploadPage)]
pub fn bill_upload_page() -> Html {
    let toast = use_context::<ToastHandle>().unwrap_or_default();

    let uploading = use_state(|| false);
    let drag_active = use_state(|| false);
    let result = use_state(|| None::<UploadedBill>);
    let bills = use_state(Vec::<StoredBill>::new);

    let load_bills = {
        let bills = bills.clone();
        Callback::from(move |_: ()| {
            let bills = bills.clone();
            spawn_local(async move {
                if let Ok(resp) = api::get_json::<BillsResponse>("/api/bills").await {
                    bills.set(resp.bills);
                }
            });
        })
    };

    {
        let load_bills = load_bills.clone();
        use_effect_with_deps(
            move |_| {
                load_bills.emit(());
                || ()
            },
            (),
        );
    }

    let upload_file = {
        let uploading = uploading.clone();
        let result = result.clone();
        let toast = toast.clone();
        let load_bills = load_bills.clone();
        Callback::from(move |file: File| {
            let name = file.name();
            if !allowed_bill_file(&name) {
                toast.error("Only image files (PNG, JPG, etc.) are allowed.");
                return;
            }
            if *uploading {
                return;
            }
            uploading.set(true);

            let uploading = uploading.clone();
            let result = result.clone();
            let toast = toast.clone();
            let load_bills = load_bills.clone();
            spawn_local(async move {
                let form = match FormData::new() {
                    Ok(form) => form,
                    Err(_) => {
                        uploading.set(false);
                        return;
                    }
                };
                let _ = form.append_with_blob_and_filename("file", &file, &name);

                match api::post_form::<UploadResponse>("/api/bills/upload", form).await {
                    Ok(resp) => {
                        result.set(Some(resp.bill));
                        toast.show(
                            "Bill scanned and added to your ledger.",
                            crate::toast::ToastIntent::Success,
                            Some("Upload complete".to_string()),
                        );
                        load_bills.emit(());
                    }
                    Err(msg) => toast.error(msg),
                }
                uploading.set(false);
            });
        })
    };

    let on_file_change = {
        let upload_file = upload_file.clone();
        Callback::from(move |e: Event| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            if let Some(files) = input.files() {
                if let Some(file) = files.get(0) {
                    upload_file.emit(file);
                }
            }
            input.set_value("");
        })
    };

    let on_drag_over = {
        let drag_active = drag_active.clone();
        Callback::from(move |e: DragEvent| {
            e.prevent_default();
            drag_active.set(true);
        })
    };

    let on_drag_leave = {
        let drag_active = drag_active.clone();
        Callback::from(move |e: DragEvent| {
            e.prevent_default();
            drag_active.set(false);
        })
    };

    let on_drop = {
        let upload_file = upload_file.clone();
        let drag_active = drag_active.clone();
        Callback::from(move |e: DragEvent| {
            e.prevent_default();
            drag_active.set(false);
            if let Some(transfer) = e.data_transfer() {
                if let Some(files) = transfer.files() {
                    if let Some(file) = files.get(0) {
                        upload_file.emit(file);
                    }
                }
            }
        })
    };

    let drop_class = if *drag_active {
        "bg-[#eef4f9] border-2 border-dashed border-[#173E63] rounded-[10px] p-10 flex flex-col items-center gap-3 transition-colors"
    } else {
        "bg-card border-2 border-dashed border-border rounded-[10px] p-10 flex flex-col items-center gap-3 transition-colors"
    };

    html! {
        { page_shell(
            "Bill Upload",
            html! {},
            html! {
                <>
                    <div
                        class={drop_class}
                        ondragover={on_drag_over}
                        ondragleave={on_drag_leave}
                        ondrop={on_drop}
                    >
                        { icon_upload() }
                        <p class="text-sm text-muted-foreground">
                            { if *uploading { "Scanning your bill..." } else { "Drag a bill photo here, or" } }
                        </p>
                        <label class="bg-primary text-primary-foreground px-6 py-2 rounded-xl font-bold text-sm cursor-pointer">
                            {"Choose a file"}
                            <input type="file" accept="image/*" class="hidden" onchange={on_file_change} disabled={*uploading} />
                        </label>
                        <p class="text-xs text-muted-foreground">{"PNG, JPG, WEBP and similar image formats."}</p>
                    </div>

                    {
                        if let Some(bill) = &*result {
                            html! {
                                <div class="bg-card rounded-[10px] p-6 border border-border space-y-3">
                                    <div class="flex items-center justify-between">
                                        <h3 class="font-bold text-foreground text-lg">{"Scanned Bill"}</h3>
                                        {
                                            if let Some(confidence) = bill.confidence {
                                                html! {
                                                    <span class="text-xs text-muted-foreground">
                                                        { format!("Confidence: {:.0}%", confidence * 100.0) }
                                                    </span>
                                                }
                                            } else { html!{} }
                                        }
                                    </div>
                                    <div class="grid grid-cols-2 md:grid-cols-4 gap-4 text-sm">
                                        <div>
                                            <p class="text-muted-foreground text-xs">{"Vendor"}</p>
                                            <p class="font-semibold text-foreground">{ bill.vendor_name.clone().unwrap_or_else(|| "Unknown".into()) }</p>
                                        </div>
                                        <div>
                                            <p class="text-muted-foreground text-xs">{"Date"}</p>
                                            <p class="font-semibold text-foreground">{ bill.bill_date.clone().unwrap_or_else(|| "—".into()) }</p>
                                        </div>
                                        <div>
                                            <p class="text-muted-foreground text-xs">{"Total"}</p>
                                            <p class="font-semibold text-foreground">{ bill.total_amount.map(format_currency).unwrap_or_else(|| "—".into()) }</p>
                                        </div>
                                        <div>
                                            <p class="text-muted-foreground text-xs">{"GST"}</p>
                                            <p class="font-semibold text-foreground">{ bill.gst_amount.map(format_currency).unwrap_or_else(|| "—".into()) }</p>
                                        </div>
                                    </div>
                                    {
                                        match &bill.items {
                                            Some(items) if !items.is_empty() => html! {
                                                <div class="pt-2 border-t border-border">
                                                    <p class="text-xs font-bold text-muted-foreground uppercase tracking-widest mb-2">{"Items"}</p>
                                                    <ul class="space-y-1">
                                                        { for items.iter().map(|item| html! {
                                                            <li class="flex items-center justify-between text-sm">
                                                                <span class="text-foreground">{ format!("{} × {}", item.quantity, item.description) }</span>
                                                                <span class="text-muted-foreground">{ format_currency(item.amount) }</span>
                                                            </li>
                                                        }) }
                                                    </ul>
                                                </div>
                                            },
                                            _ => html! {},
                                        }
                                    }
                                </div>
                            }
                        } else { html!{} }
                    }

                    <div class="bg-card rounded-[10px] border border-border overflow-hidden">
                        <div class="p-5 border-b border-border">
                            <h3 class="font-bold text-foreground text-lg">{"Recent Bills"}</h3>
                        </div>
                        <div class="overflow-x-auto">
                            <table class="w-full text-left border-collapse">
                                <thead>
                                    <tr class="bg-muted text-muted-foreground text-[10px] uppercase tracking-widest">
                                        <th class="px-8 py-4 font-bold">{"Uploaded"}</th>
                                        <th class="px-8 py-4 font-bold">{"File"}</th>
                                        <th class="px-8 py-4 font-bold">{"Vendor"}</th>
                                        <th class="px-8 py-4 font-bold">{"Status"}</th>
                                        <th class="px-8 py-4 font-bold text-right">{"Total"}</th>
                                    </tr>
                                </thead>
                                <tbody class="divide-y divide-border">
                                    { if bills.is_empty() {
                                        html! { <tr><td colspan="5" class="px-8 py-6 text-center text-muted-foreground">{"No bills uploaded yet."}</td></tr> }
                                    } else {
                                        html! {
                                            <>
                                                { for bills.iter().map(|bill| html! {
                                                    <tr key={bill.id} class="text-sm hover:bg-muted/40 transition-colors">
                                                        <td class="px-8 py-4 text-muted-foreground">{ bill.created_at.clone() }</td>
                                                        <td class="px-8 py-4 text-foreground">{ bill.filename.clone() }</td>
                                                        <td class="px-8 py-4 text-foreground">{ bill.vendor_name.clone().unwrap_or_else(|| "—".into()) }</td>
                                                        <td class="px-8 py-4">
                                                            <span class="bg-secondary text-secondary-foreground px-3 py-1 rounded-full text-[10px] font-bold uppercase">{ bill.status.clone() }</span>
                                                        </td>
                                                        <td class="px-8 py-4 text-right font-semibold text-foreground">{ bill.total_amount.map(format_currency).unwrap_or_else(|| "—".into()) }</td>
                                                    </tr>
                                                }) }
                                            </>
                                        }
                                    }}
                                </tbody>
                            </table>
                        </div>
                    </div>
                </>
            }
        ) }
    }
}
